//! Proptest generators for property-based testing.

use proptest::prelude::*;

use coursevault::upload::allowed_extensions;
use coursevault::ContentKind;

/// Generate plaintext of at most `max_len` bytes.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate non-empty plaintext of at most `max_len` bytes.
pub fn upload_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Generate a ContentKind.
pub fn content_kind() -> impl Strategy<Value = ContentKind> {
    prop_oneof![Just(ContentKind::Pdf), Just(ContentKind::Video)]
}

/// Generate a filename accepted for `kind`.
pub fn upload_filename(kind: ContentKind) -> impl Strategy<Value = String> {
    let exts = allowed_extensions(kind);
    (
        "[A-Za-z0-9][A-Za-z0-9 _-]{0,23}",
        prop::sample::select(exts),
        any::<bool>(),
    )
        .prop_map(|(stem, ext, upper)| {
            let ext = if upper { ext.to_uppercase() } else { ext.to_string() };
            format!("{}.{}", stem, ext)
        })
}

/// Generate arbitrary, possibly hostile, client-supplied filenames.
pub fn hostile_filename() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "(\\.\\./){1,4}[a-z]{1,8}(\\.pdf)?",
        "[A-Z]:\\\\([a-z]{1,6}\\\\){1,3}[a-z ]{1,8}\\.mp4",
        "\\.{1,3}",
    ]
}

/// Parameters for one upload.
#[derive(Debug, Clone)]
pub struct UploadParams {
    pub kind: ContentKind,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Arbitrary for UploadParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        content_kind()
            .prop_flat_map(|kind| {
                (Just(kind), upload_filename(kind), upload_bytes(2048))
            })
            .prop_map(|(kind, filename, bytes)| UploadParams {
                kind,
                filename,
                bytes,
            })
            .boxed()
    }
}
