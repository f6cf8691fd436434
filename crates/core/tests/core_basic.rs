use firmdex_core::model::{TagColor, MIME_NOT_RUN};
use firmdex_core::version;

#[test]
fn version_is_non_empty() {
    let v = version();
    assert!(!v.is_empty());
}

#[test]
fn tag_colors_render_as_display_classes() {
    assert_eq!(TagColor::LightBlue.as_str(), "info");
    assert_eq!(TagColor::Red.as_str(), "danger");
    assert_eq!(MIME_NOT_RUN, "file-type-plugin/not-run-yet");
}
