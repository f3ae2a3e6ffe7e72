//! Maps a file name to its handling strategy. Pure classification, no I/O.

/// Formats the drive can export as a PDF rendition for text extraction.
/// Mirrors the provider's documented conversion support.
const CONVERTIBLE_EXTENSIONS: [&str; 16] = [
    "pdf", "doc", "docx", "odp", "ods", "odt", "pot", "potm", "potx", "pps", "ppsx", "ppsxm",
    "ppt", "pptm", "pptx", "rtf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    PlainText,
    DelimitedText,
    ConvertibleDocument,
    Unsupported,
}

/// Classifies a file name by extension, case-insensitive. Total: unknown or
/// missing extensions map to `Unsupported`.
pub fn classify(name: &str) -> FileFormat {
    let extension = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => extension.to_ascii_lowercase(),
        _ => return FileFormat::Unsupported,
    };

    match extension.as_str() {
        "txt" => FileFormat::PlainText,
        "csv" => FileFormat::DelimitedText,
        other if CONVERTIBLE_EXTENSIONS.contains(&other) => FileFormat::ConvertibleDocument,
        _ => FileFormat::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_classify_case_insensitively() {
        assert_eq!(classify("notes.txt"), FileFormat::PlainText);
        assert_eq!(classify("NOTES.TXT"), FileFormat::PlainText);
        assert_eq!(classify("table.csv"), FileFormat::DelimitedText);
        assert_eq!(classify("deck.PPTX"), FileFormat::ConvertibleDocument);
        assert_eq!(classify("report.pdf"), FileFormat::ConvertibleDocument);
        assert_eq!(classify("memo.Rtf"), FileFormat::ConvertibleDocument);
    }

    #[test]
    fn unknown_or_missing_extensions_are_unsupported() {
        assert_eq!(classify("image.png"), FileFormat::Unsupported);
        assert_eq!(classify("archive.tar.gz"), FileFormat::Unsupported);
        assert_eq!(classify("no_extension"), FileFormat::Unsupported);
        assert_eq!(classify(""), FileFormat::Unsupported);
        assert_eq!(classify(".gitignore"), FileFormat::Unsupported);
    }

    #[test]
    fn every_convertible_extension_is_in_the_allow_list() {
        for extension in CONVERTIBLE_EXTENSIONS {
            let name = format!("file.{extension}");
            assert_eq!(classify(&name), FileFormat::ConvertibleDocument, "{name}");
        }
    }

    #[test]
    fn classification_is_deterministic() {
        for name in ["a.txt", "b.csv", "c.docx", "d.xyz"] {
            assert_eq!(classify(name), classify(name));
        }
    }
}
