//! Content-based MIME detection.
//!
//! The allow-list is checked against what a file *is*, not what it is named,
//! so detection looks at leading magic bytes. The extension is only consulted
//! to narrow down an ISO base media file whose brand we do not know.

use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Number of leading bytes inspected.
pub const SNIFF_LEN: u64 = 512;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Reads the head of `path` and detects its MIME type.
pub async fn sniff_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN).read_to_end(&mut head).await?;
    Ok(sniff_mime(&head, path))
}

/// Detects a MIME type from leading file bytes.
pub fn sniff_mime(head: &[u8], path: &Path) -> String {
    if let Some(mime) = iso_bmff(head, path) {
        return mime;
    }

    let mime = if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        // EBML; WebM declares its doctype near the start
        if head.windows(4).take(64).any(|w| w == b"webm") {
            "video/webm"
        } else {
            "video/x-matroska"
        }
    } else if head.starts_with(b"RIFF") && head.len() >= 12 {
        match &head[8..12] {
            b"AVI " => "video/x-msvideo",
            b"WAVE" => "audio/x-wav",
            _ => OCTET_STREAM,
        }
    } else if head.starts_with(b"OggS") {
        if head.windows(7).any(|w| w == b"\x80theora") {
            "video/ogg"
        } else {
            "audio/ogg"
        }
    } else if head.starts_with(b"FLV\x01") {
        "video/x-flv"
    } else if head.starts_with(&[0x00, 0x00, 0x01, 0xBA])
        || head.starts_with(&[0x00, 0x00, 0x01, 0xB3])
    {
        "video/mpeg"
    } else if head.len() > 188 && head[0] == 0x47 && head[188] == 0x47 {
        "video/mp2t"
    } else if head.starts_with(b"fLaC") {
        "audio/flac"
    } else if head.starts_with(b"ID3")
        || (head.len() >= 2 && head[0] == 0xFF && head[1] & 0xE0 == 0xE0)
    {
        "audio/mpeg"
    } else {
        OCTET_STREAM
    };

    mime.to_string()
}

fn iso_bmff(head: &[u8], path: &Path) -> Option<String> {
    if head.len() < 12 {
        return None;
    }

    let atom = &head[4..8];
    if atom != b"ftyp" {
        // pre-ftyp QuickTime movies open straight into a top-level atom
        return matches!(atom, b"moov" | b"mdat" | b"wide" | b"free" | b"skip" | b"pnot")
            .then(|| "video/quicktime".to_string());
    }

    let brand = &head[8..12];
    let mime = match brand {
        b"qt  " => "video/quicktime",
        b"M4V " | b"M4VH" | b"M4VP" => "video/x-m4v",
        b"M4A " => "audio/mp4",
        _ if brand.starts_with(b"3gp") => "video/3gpp",
        _ if brand.starts_with(b"3g2") => "video/3gpp2",
        b"isom" | b"iso2" | b"iso4" | b"iso5" | b"iso6" | b"mp41" | b"mp42" | b"avc1" | b"dash"
        | b"MSNV" => "video/mp4",
        _ => {
            // unknown brand: trust the extension only when it names media
            return mime_guess::from_path(path)
                .first()
                .filter(|mime| {
                    let kind = mime.type_();
                    kind == mime_guess::mime::VIDEO || kind == mime_guess::mime::AUDIO
                })
                .map(|mime| mime.essence_str().to_string());
        }
    };
    Some(mime.to_string())
}
