//! Content extraction: bytes + declared media type -> searchable text.
//!
//! Extraction is a pure function of its inputs. Running it twice over the
//! same bytes produces the same output, which is what lets the pipeline
//! re-run a job after a crash without further coordination.
//!
//! Plain-text media is decoded as UTF-8 (lossily). Binary document
//! containers (PDF, Word, PowerPoint) are mined with a best-effort scan for
//! printable text runs; a full format parser is deliberately not part of
//! this crate. Media types outside the extractable set yield `None`, which
//! is an ordinary outcome, not a failure.

/// Upper bound on stored extracted text, in characters. Longer extractions
/// are truncated, never rejected.
pub const MAX_EXTRACTED_CHARS: usize = 100_000;

/// Minimum length of a printable run worth keeping when mining binary
/// container formats. Shorter runs are overwhelmingly format noise.
const MIN_RUN_LEN: usize = 4;

/// Media types the extractor knows how to mine for text.
///
/// Everything else (images in particular) is stored as-is and reported as
/// having no extractable content.
pub fn is_extractable(mime_type: &str) -> bool {
    mime_type == "application/pdf"
        || mime_type.starts_with("text/")
        || mime_type == "application/msword"
        || mime_type == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        || mime_type == "application/vnd.ms-powerpoint"
        || mime_type == "application/vnd.openxmlformats-officedocument.presentationml.presentation"
}

/// Extract searchable text from a stored object.
///
/// Returns `None` when the media type is not in the extractable set or the
/// payload yields no usable text. The result is already truncated to
/// [`MAX_EXTRACTED_CHARS`].
pub fn extract_text(bytes: &[u8], mime_type: &str) -> Option<String> {
    if !is_extractable(mime_type) {
        return None;
    }

    let text = if mime_type.starts_with("text/") {
        String::from_utf8_lossy(bytes).trim().to_string()
    } else {
        printable_runs(bytes)
    };

    if text.is_empty() {
        return None;
    }
    Some(truncate_extracted(text))
}

/// Truncate extracted text to [`MAX_EXTRACTED_CHARS`] characters, respecting
/// char boundaries.
pub fn truncate_extracted(text: String) -> String {
    match text.char_indices().nth(MAX_EXTRACTED_CHARS) {
        Some((byte_idx, _)) => {
            let mut t = text;
            t.truncate(byte_idx);
            t
        }
        None => text,
    }
}

/// Collect printable ASCII/whitespace runs of at least [`MIN_RUN_LEN`] chars
/// from a binary payload, joined by single spaces.
fn printable_runs(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut run = String::new();

    for &b in bytes {
        let c = b as char;
        if b.is_ascii_graphic() || b == b' ' {
            run.push(c);
        } else {
            flush_run(&mut out, &mut run);
        }
    }
    flush_run(&mut out, &mut run);

    out
}

fn flush_run(out: &mut String, run: &mut String) {
    if run.trim().len() >= MIN_RUN_LEN {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(run.trim());
    }
    run.clear();
}
