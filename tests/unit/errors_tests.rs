/*!
 * Tests for error classification
 */

use shadowreel::errors::{ErrorKind, GenerationError, ToolError};

#[test]
fn test_toolError_intoGenerationError_shouldBeExternalTool() {
    let err: GenerationError = ToolError::Timeout {
        tool: "ffmpeg".to_string(),
        seconds: 600,
    }
    .into();

    assert_eq!(err.kind(), ErrorKind::ExternalToolError);
    assert!(err.to_string().contains("ffmpeg timed out after 600s"));
}

#[test]
fn test_ioError_intoGenerationError_shouldBeExternalTool() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let err = GenerationError::from(io);
    assert_eq!(err.kind(), ErrorKind::ExternalToolError);
}

#[test]
fn test_errorKind_shouldSerializeByName() {
    assert_eq!(
        serde_json::to_string(&ErrorKind::MissingResourceError).unwrap(),
        "\"MissingResourceError\""
    );
    assert_eq!(ErrorKind::EmptyOutputError.to_string(), "EmptyOutputError");
}
