//! Classification of remote files into native documents and opaque content.
//!
//! Native Google documents have no byte representation of their own and must
//! be exported to a concrete format; everything else is fetched verbatim.

/// Extension appended to the output name of every exported native document.
///
/// Applied uniformly, including to spreadsheet and presentation exports whose
/// content is not plain text. Inherited behavior, kept as-is.
pub const EXPORT_EXTENSION: &str = "txt";

/// Export targets for native Google document types.
const EXPORT_MAPPING: &[(&str, &str)] = &[
    ("application/vnd.google-apps.document", "text/plain"),
    (
        "application/vnd.google-apps.spreadsheet",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("application/vnd.google-apps.presentation", "application/pdf"),
];

/// How a remote file's content must be retrieved, resolved once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A native Google document that must be exported as `export_mime`.
    NativeDocument { export_mime: &'static str },
    /// A regular file whose bytes can be fetched directly.
    Opaque,
}

impl FileKind {
    /// Classify a file by its MIME type tag.
    ///
    /// Tags absent from the export mapping (including a missing tag) are
    /// treated as opaque binary content.
    pub fn classify(mime_type: Option<&str>) -> FileKind {
        let Some(mime_type) = mime_type else {
            return FileKind::Opaque;
        };

        EXPORT_MAPPING
            .iter()
            .find(|(native, _)| *native == mime_type)
            .map(|(_, export_mime)| FileKind::NativeDocument { export_mime })
            .unwrap_or(FileKind::Opaque)
    }

    /// The local file name for a download of `name` with this kind.
    pub fn output_name(&self, name: &str) -> String {
        match self {
            FileKind::NativeDocument { .. } => format!("{}.{}", name, EXPORT_EXTENSION),
            FileKind::Opaque => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_document() {
        let kind = FileKind::classify(Some("application/vnd.google-apps.document"));
        assert_eq!(
            kind,
            FileKind::NativeDocument {
                export_mime: "text/plain"
            }
        );
    }

    #[test]
    fn test_classify_spreadsheet() {
        let kind = FileKind::classify(Some("application/vnd.google-apps.spreadsheet"));
        assert_eq!(
            kind,
            FileKind::NativeDocument {
                export_mime:
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        );
    }

    #[test]
    fn test_classify_presentation() {
        let kind = FileKind::classify(Some("application/vnd.google-apps.presentation"));
        assert_eq!(
            kind,
            FileKind::NativeDocument {
                export_mime: "application/pdf"
            }
        );
    }

    #[test]
    fn test_classify_regular_file() {
        assert_eq!(FileKind::classify(Some("application/pdf")), FileKind::Opaque);
        assert_eq!(FileKind::classify(Some("image/png")), FileKind::Opaque);
    }

    #[test]
    fn test_classify_missing_mime_type() {
        assert_eq!(FileKind::classify(None), FileKind::Opaque);
    }

    #[test]
    fn test_every_native_type_has_one_mapping() {
        for (native, _) in EXPORT_MAPPING {
            let count = EXPORT_MAPPING
                .iter()
                .filter(|(other, _)| other == native)
                .count();
            assert_eq!(count, 1, "duplicate mapping for {}", native);
        }
    }

    #[test]
    fn test_output_name_for_export() {
        let kind = FileKind::classify(Some("application/vnd.google-apps.document"));
        assert_eq!(kind.output_name("Meeting notes"), "Meeting notes.txt");
    }

    #[test]
    fn test_output_name_appends_txt_even_for_pdf_export() {
        // Presentation exports are PDF bytes but still get the .txt suffix.
        let kind = FileKind::classify(Some("application/vnd.google-apps.presentation"));
        assert_eq!(kind.output_name("Pitch deck"), "Pitch deck.txt");
    }

    #[test]
    fn test_output_name_for_opaque() {
        assert_eq!(FileKind::Opaque.output_name("photo.png"), "photo.png");
    }
}
