// The default client is process-wide, so everything touching it lives in
// this single test binary and a single test.

use textsynth::{ErrorKind, TextSynthClient};

#[test]
fn test_installed_default_client_is_used() {
    let client = TextSynthClient::new("example.test", "k").unwrap();
    textsynth::set_default_client(client).unwrap();

    let engine = textsynth::engine("gptj_6B").unwrap();
    assert_eq!(engine.engine_id(), "gptj_6B");
    assert_eq!(engine.client().base_url(), "https://example.test");
    assert_eq!(
        textsynth::default_client().unwrap().base_url(),
        "https://example.test"
    );

    let other = TextSynthClient::new("other.test", "k").unwrap();
    let err = textsynth::set_default_client(other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
