//! Container detection from leading magic bytes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Wav,
    Mpeg,
    Flac,
    Ogg,
    Mp4,
    Unknown,
}

impl FileKind {
    pub fn mime(self) -> &'static str {
        match self {
            FileKind::Wav => "audio/x-wav",
            FileKind::Mpeg => "audio/mpeg",
            FileKind::Flac => "audio/x-flac",
            FileKind::Ogg => "audio/ogg",
            FileKind::Mp4 => "audio/mp4",
            FileKind::Unknown => "application/octet-stream",
        }
    }
}

/// Identify a file from its first bytes.
pub fn sniff_bytes(bytes: &[u8]) -> FileKind {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        return FileKind::Wav;
    }
    if bytes.starts_with(b"fLaC") {
        return FileKind::Flac;
    }
    if bytes.starts_with(b"ID3") {
        return FileKind::Mpeg;
    }
    // MPEG audio frame sync (11 set bits) with a non-reserved layer; layer
    // bits of 00 are ADTS AAC.
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0 && bytes[1] & 0x06 != 0 {
        return FileKind::Mpeg;
    }
    if bytes.starts_with(b"OggS") {
        return FileKind::Ogg;
    }
    if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
        return FileKind::Mp4;
    }
    FileKind::Unknown
}

pub fn sniff_file(path: &Path) -> std::io::Result<FileKind> {
    let mut head = Vec::with_capacity(12);
    File::open(path)?.take(12).read_to_end(&mut head)?;
    Ok(sniff_bytes(&head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_headers() {
        assert_eq!(sniff_bytes(b"RIFF\x24\x08\x00\x00WAVEfmt "), FileKind::Wav);
        assert_eq!(sniff_bytes(b"fLaC\x00\x00\x00\x22"), FileKind::Flac);
        assert_eq!(sniff_bytes(b"ID3\x04\x00\x00"), FileKind::Mpeg);
        assert_eq!(sniff_bytes(&[0xFF, 0xFB, 0x90, 0x64]), FileKind::Mpeg);
        assert_eq!(sniff_bytes(b"OggS\x00\x02"), FileKind::Ogg);
        assert_eq!(sniff_bytes(b"\x00\x00\x00\x20ftypM4A "), FileKind::Mp4);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(sniff_bytes(b""), FileKind::Unknown);
        assert_eq!(sniff_bytes(b"RIFF\x00\x00\x00\x00AVI "), FileKind::Unknown);
        assert_eq!(sniff_bytes(b"hello world"), FileKind::Unknown);
        // ADTS AAC shares the frame sync but has layer bits 00.
        assert_eq!(sniff_bytes(&[0xFF, 0xF1, 0x50, 0x80]), FileKind::Unknown);
        assert_eq!(sniff_bytes(&[0xFF, 0xF9, 0x50, 0x80]), FileKind::Unknown);
        assert_eq!(FileKind::Unknown.mime(), "application/octet-stream");
    }
}
