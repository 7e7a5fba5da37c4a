use std::collections::HashMap;

use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{BehaviorVersion, Region},
    Client as S3Client,
};
use gallery::{
    identity_pool::mock::MockIdentityPool,
    media_storage::{ObjectStoreClient, ObjectStoreConnector, S3Connector, S3ObjectStore},
    session::Session,
    types::SIGNED_URL_EXPIRY,
};
use url::Url;

const BUCKET: &str = "privatedatabucket";
const KEY: &str = "private-data/pets/cat.jpg";

fn base_config() -> aws_sdk_s3::config::Builder {
    aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
}

fn query(url: &str) -> (Url, HashMap<String, String>) {
    let parsed = Url::parse(url).expect("presigned URL should parse");
    let params = parsed.query_pairs().into_owned().collect();
    (parsed, params)
}

#[tokio::test]
async fn test_presigned_get_expires_in_sixty_seconds() {
    let config = base_config()
        .credentials_provider(Credentials::from_keys(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
            Some("session-token".to_string()),
        ))
        .build();
    let store = S3ObjectStore::new(S3Client::from_conf(config));

    let url = store
        .presign_get(BUCKET, KEY, SIGNED_URL_EXPIRY)
        .await
        .expect("presigning is local and should succeed");

    let (parsed, params) = query(&url);
    assert!(parsed.host_str().unwrap_or_default().contains(BUCKET));
    assert!(parsed.path().ends_with("cat.jpg"));
    assert_eq!(params.get("X-Amz-Expires").map(String::as_str), Some("60"));
    assert!(params["X-Amz-Credential"].starts_with("AKIDEXAMPLE/"));
    assert_eq!(
        params.get("X-Amz-Security-Token").map(String::as_str),
        Some("session-token")
    );
    assert!(params.contains_key("X-Amz-Signature"));
}

#[tokio::test]
async fn test_connector_signs_with_session_credentials() {
    let connector = S3Connector::new(base_config().build());
    let session = Session::new(
        MockIdentityPool::credentials_for("us-east-1:connector"),
        "Jane",
    );

    let store = connector.connect(&session);
    let url = store
        .presign_get(BUCKET, KEY, SIGNED_URL_EXPIRY)
        .await
        .expect("presigning is local and should succeed");

    let (_, params) = query(&url);
    assert!(params["X-Amz-Credential"].starts_with("ASIAMOCKACCESSKEY/"));
    assert_eq!(
        params.get("X-Amz-Security-Token").map(String::as_str),
        Some("mock-session-token")
    );
    assert_eq!(params.get("X-Amz-Expires").map(String::as_str), Some("60"));
}
