//! ID3 embedding for downloaded files.

use std::path::Path;

use id3::frame::{Content, Frame, Picture, PictureType};
use id3::{Tag, TagLike, Version};

use crate::error::SyncError;

/// Fields to embed into one file.
pub struct TagFields<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    /// Cover image bytes and MIME type, when available.
    pub cover: Option<(Vec<u8>, String)>,
}

/// Rewrite the file's embedded metadata container.
///
/// Cover embedding is skipped when the file already carries a picture.
/// Tags are written as ID3v2.3; constrained playback devices do not read
/// v2.4 frames.
pub fn embed(path: &Path, fields: &TagFields) -> Result<(), SyncError> {
    let mut tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => Tag::new(),
        Err(e) => {
            return Err(SyncError::Tag {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };

    tag.set_title(fields.title);
    tag.set_artist(fields.artist);
    tag.set_album(fields.album);

    if let Some((data, mime)) = &fields.cover {
        if tag.pictures().next().is_none() {
            let picture = Picture {
                mime_type: mime.clone(),
                picture_type: PictureType::CoverFront,
                description: String::new(),
                data: data.clone(),
            };
            tag.add_frame(Frame::with_content("APIC", Content::Picture(picture)));
        }
    }

    tag.write_to_path(path, Version::Id3v23)
        .map_err(|e| SyncError::Tag {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fields<'a>(cover: Option<(Vec<u8>, String)>) -> TagFields<'a> {
        TagFields {
            title: "Song Title",
            artist: "Artist",
            album: "Album",
            cover,
        }
    }

    // Untagged placeholder audio; anything without an ID3 header works.
    fn write_audio(path: &std::path::Path) {
        std::fs::write(path, [0u8; 256]).unwrap();
    }

    #[test]
    fn test_embed_writes_text_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        write_audio(&path);

        embed(&path, &fields(None)).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("Song Title"));
        assert_eq!(tag.artist(), Some("Artist"));
        assert_eq!(tag.album(), Some("Album"));
        assert_eq!(tag.pictures().count(), 0);
    }

    #[test]
    fn test_embed_keeps_existing_picture() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        write_audio(&path);

        let first = vec![1u8, 2, 3];
        embed(&path, &fields(Some((first.clone(), "image/jpeg".to_string())))).unwrap();

        // A second pass with a different image must not replace the cover
        embed(&path, &fields(Some((vec![9u8, 9], "image/png".to_string())))).unwrap();

        let tag = Tag::read_from_path(&path).unwrap();
        let pictures: Vec<&Picture> = tag.pictures().collect();
        assert_eq!(pictures.len(), 1);
        assert_eq!(pictures[0].data, first);
        assert_eq!(pictures[0].mime_type, "image/jpeg");
    }
}
