use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// MIME type for the formats a document translator deals with.
pub fn mime_from_extension(filename: &str) -> String {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => mime::APPLICATION_PDF.to_string(),
        "txt" => mime::TEXT_PLAIN_UTF_8.to_string(),
        "htm" | "html" => mime::TEXT_HTML_UTF_8.to_string(),
        "docx" => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string()
        }
        "pptx" => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
                .to_string()
        }
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        "doc" => "application/msword".to_string(),
        "xlf" | "xliff" => "application/x-xliff+xml".to_string(),
        "srt" => "application/x-subrip".to_string(),
        _ => mime::APPLICATION_OCTET_STREAM.to_string(),
    }
}

/// Picks the MIME type to store for an upload.
///
/// A specific client-declared type wins; otherwise the extension is
/// consulted, then the bytes are sniffed.
pub fn detect_mime_type(declared: Option<&str>, filename: &str, data: &[u8]) -> String {
    let declared = declared
        .map(str::trim)
        .filter(|d| !d.is_empty() && *d != mime::APPLICATION_OCTET_STREAM.as_ref());
    if let Some(declared) = declared {
        return declared.to_string();
    }

    let from_extension = mime_from_extension(filename);
    if from_extension != mime::APPLICATION_OCTET_STREAM.as_ref() {
        return from_extension;
    }

    infer::get(data)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or(from_extension)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 encoded name.
pub fn attachment_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(128)
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "document"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("a.PDF"), "application/pdf");
        assert!(mime_from_extension("a.docx").contains("wordprocessingml"));
        assert_eq!(mime_from_extension("noextension"), "application/octet-stream");
    }

    #[test]
    fn test_detect_mime_type_prefers_declared() {
        assert_eq!(
            detect_mime_type(Some("text/plain"), "notes.pdf", b"%PDF-1.7"),
            "text/plain"
        );
    }

    #[test]
    fn test_detect_mime_type_sniffs_octet_stream() {
        assert_eq!(
            detect_mime_type(Some("application/octet-stream"), "scan", b"%PDF-1.7\n"),
            "application/pdf"
        );
        assert_eq!(
            detect_mime_type(None, "blob", b"\x00\x01"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_attachment_disposition() {
        let header = attachment_disposition("relatório final.pdf");
        assert!(header.starts_with("attachment; filename=\"relatrio final.pdf\""));
        assert!(header.contains("filename*=UTF-8''relat%C3%B3rio%20final%2Epdf"));
    }
}
