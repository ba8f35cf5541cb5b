fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use dropshare_protocol::{ClientMessage, ServerMessage};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Client frames ---

    #[test]
    fn fixture_upload_chunk() {
        let msg = roundtrip_test::<ClientMessage>("upload_chunk.json");
        match msg {
            ClientMessage::UploadChunk {
                name,
                chunk_index,
                total_chunks,
                ..
            } => {
                assert_eq!(name, "holiday photo.jpg");
                assert_eq!(chunk_index, 0);
                assert_eq!(total_chunks, 4);
            }
            other => panic!("expected upload_chunk, got {other:?}"),
        }
    }

    #[test]
    fn fixture_upload_chunk_last() {
        let msg = roundtrip_test::<ClientMessage>("upload_chunk_last.json");
        assert!(matches!(
            msg,
            ClientMessage::UploadChunk { chunk_index: 1599, total_chunks: 1600, .. }
        ));
    }

    #[test]
    fn fixture_ping() {
        let msg = roundtrip_test::<ClientMessage>("ping.json");
        assert_eq!(msg, ClientMessage::Ping);
    }

    #[test]
    fn client_text_matches_fixture() {
        // The text form sent on the socket, not just the value, must match.
        let fixture = load_fixture("ping.json");
        let text = ClientMessage::Ping.to_json().unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&text).unwrap(), fixture);
    }

    // --- Server frames ---

    #[test]
    fn fixture_link() {
        let msg = roundtrip_test::<ServerMessage>("link.json");
        assert_eq!(msg, ServerMessage::Link { code: "k3x9QZ".into() });
    }

    #[test]
    fn fixture_stats() {
        let msg = roundtrip_test::<ServerMessage>("stats.json");
        assert_eq!(msg, ServerMessage::Stats { downloads: 42 });
    }

    #[test]
    fn fixture_error() {
        let msg = roundtrip_test::<ServerMessage>("error.json");
        assert_eq!(
            msg,
            ServerMessage::Error {
                message: "File exceeds the 100 MB limit".into()
            }
        );
    }

    #[test]
    fn fixture_unknown_type_is_tolerated() {
        let fixture = load_fixture("unknown_type.json");
        let msg: ServerMessage = serde_json::from_value(fixture).unwrap();
        assert_eq!(msg, ServerMessage::Unknown);
    }

    // --- Server quirks ---

    #[test]
    fn stats_with_extra_fields() {
        let json = r#"{"type":"stats","downloads":3,"uploadedAt":"2026-01-01"}"#;
        let msg = ServerMessage::from_json(json).unwrap();
        assert_eq!(msg, ServerMessage::Stats { downloads: 3 });
    }

    #[test]
    fn link_missing_code_is_rejected() {
        assert!(ServerMessage::from_json(r#"{"type":"link"}"#).is_err());
    }
}
