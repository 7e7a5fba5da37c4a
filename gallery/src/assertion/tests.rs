use super::*;

mod test_helpers {
    use super::*;

    pub fn b64(bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Builds an unsigned-but-well-formed token around `payload`
    pub fn create_test_token(payload: &serde_json::Value) -> String {
        let header = b64(br#"{"alg":"RS256","kid":"test-kid","typ":"JWT"}"#);
        let payload = b64(payload.to_string().as_bytes());
        format!("{header}.{payload}.c2lnbmF0dXJl")
    }
}

mod token_parsing {
    use super::test_helpers::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_google_style_token() {
        let token = create_test_token(&json!({
            "iss": "https://accounts.google.com",
            "sub": "110169484474386276334",
            "email": "jane@example.com",
            "email_verified": true,
            "name": "Jane Doe",
            "aud": "421640755879-example.apps.googleusercontent.com",
            "exp": 1_744_106_575,
        }));

        let assertion = IdentityAssertion::parse(&token).unwrap();
        assert_eq!(assertion.display_name(), "Jane Doe");
        assert_eq!(assertion.claims().email.as_deref(), Some("jane@example.com"));
        assert_eq!(assertion.claims().exp, Some(1_744_106_575));
        assert_eq!(
            assertion.claims().aud.as_deref(),
            Some("421640755879-example.apps.googleusercontent.com")
        );
        assert_eq!(assertion.token(), token);
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let token = create_test_token(&json!({ "name": "Zoë Ünicode", "sub": "42" }));

        let first = IdentityAssertion::parse(&token).unwrap();
        let second = IdentityAssertion::parse(&token).unwrap();
        assert_eq!(first.claims(), second.claims());
        assert_eq!(first.display_name(), "Zoë Ünicode");
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(br#"{"name":"Pad"}"#);
        assert!(payload.ends_with('='));
        let token = format!("aGVhZGVy.{payload}.c2ln");

        let assertion = IdentityAssertion::parse(&token).unwrap();
        assert_eq!(assertion.display_name(), "Pad");
    }

    #[test]
    fn test_reject_malformed_tokens() {
        let object_payload = b64(br#"{"name":"x"}"#);
        let malformed_tokens = vec![
            ("empty", String::new()),
            ("missing_parts", format!("aGVhZGVy.{object_payload}")),
            ("extra_parts", format!("aGVhZGVy.{object_payload}.sig.extra")),
            ("empty_signature", format!("aGVhZGVy.{object_payload}.")),
            ("invalid_alphabet", format!("aGVh*ZGVy.{object_payload}.sig")),
            ("invalid_base64_payload", "aGVhZGVy.a.sig".to_string()),
            ("non_utf8_payload", format!("aGVhZGVy.{}.sig", b64(&[0xff, 0xfe, 0xfd]))),
            ("non_json_payload", format!("aGVhZGVy.{}.sig", b64(b"hello"))),
            ("array_payload", format!("aGVhZGVy.{}.sig", b64(b"[1,2]"))),
        ];

        for (name, token) in malformed_tokens {
            assert!(
                IdentityAssertion::parse(&token).is_err(),
                "token should be rejected: {name}"
            );
        }
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            IdentityAssertion::parse("a.b"),
            Err(AssertionError::SegmentCount(2))
        ));
        assert!(matches!(
            IdentityAssertion::parse("a..c"),
            Err(AssertionError::EmptySegment(1))
        ));
        assert!(matches!(
            IdentityAssertion::parse(&format!("aGVhZGVy.{}.sig", b64(b"null"))),
            Err(AssertionError::NotAnObject)
        ));
    }
}

mod claims {
    use super::*;

    #[test]
    fn test_display_name_fallbacks() {
        let mut claims = Claims {
            sub: Some("123".to_string()),
            email: Some("a@example.com".to_string()),
            name: Some("  ".to_string()),
            ..Claims::default()
        };
        assert_eq!(claims.display_name(), "a@example.com");

        claims.email = None;
        assert_eq!(claims.display_name(), "123");

        assert_eq!(Claims::default().display_name(), UNKNOWN_USER);
    }

    #[test]
    fn test_mistyped_claims_read_as_absent() {
        let token = test_helpers::create_test_token(&serde_json::json!({
            "sub": 123,
            "name": 42,
            "email": "jane@example.com",
            "picture": null,
            "exp": 1.7e9,
        }));

        let assertion = IdentityAssertion::parse(&token).unwrap();
        let claims = assertion.claims();
        assert_eq!(claims.sub, None);
        assert_eq!(claims.name, None);
        assert_eq!(claims.picture, None);
        assert_eq!(claims.exp, Some(1_700_000_000));
        assert_eq!(assertion.display_name(), "jane@example.com");
    }

    #[test]
    fn test_audience_string_or_list() {
        let single = test_helpers::create_test_token(&serde_json::json!({ "aud": "client-a" }));
        let list = test_helpers::create_test_token(&serde_json::json!({
            "aud": ["client-b", "client-c"],
        }));

        assert_eq!(
            IdentityAssertion::parse(&single).unwrap().claims().aud.as_deref(),
            Some("client-a")
        );
        assert_eq!(
            IdentityAssertion::parse(&list).unwrap().claims().aud.as_deref(),
            Some("client-b")
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = test_helpers::create_test_token(&serde_json::json!({ "name": "Secretive" }));
        let assertion = IdentityAssertion::parse(&token).unwrap();

        let debug = format!("{assertion:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(&token));
    }
}
