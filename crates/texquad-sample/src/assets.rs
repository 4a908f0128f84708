use anyhow::{Context, Result};

use texquad_engine::image::{decode_into, Image, ImageContainer, ImageError};
use texquad_engine::io::{FileReader, FileRoots, FileType};
use texquad_engine::memory::Arena;

/// Loads and decodes the image asset `name`.
///
/// Reserves one `staging_bytes` block from the arena: the file is read into
/// its front and decoded into the rest. The returned pixels live in the arena.
pub fn load_image<'a>(
    arena: &mut Arena<'a>,
    roots: &FileRoots,
    name: &str,
    staging_bytes: usize,
) -> Result<Image<'a>> {
    let staging = arena
        .allocate(staging_bytes)
        .with_context(|| format!("no arena room to stage {name}"))?;

    let mut reader = FileReader::open(roots, name, FileType::Asset)?;
    let size = reader.size();
    if size > staging.len() {
        return Err(ImageError::StagingTooSmall {
            needed: size,
            available: staging.len(),
        })
        .with_context(|| format!("image {name} does not fit its staging block"));
    }

    let (file_bytes, pixels) = staging.split_at_mut(size);
    reader.read(file_bytes)?;
    reader.close();

    let image = decode_into(file_bytes, ImageContainer::from_name(name), pixels)
        .with_context(|| format!("failed to decode {name}"))?;

    log::info!(
        "loaded {name}: {size} bytes, {}x{}",
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Reads the whole asset `name` into an arena block of exactly its size.
pub fn load_shader_source<'a>(
    arena: &mut Arena<'a>,
    roots: &FileRoots,
    name: &str,
) -> Result<&'a [u8]> {
    let mut reader = FileReader::open(roots, name, FileType::Asset)?;
    let source = arena
        .allocate(reader.size())
        .with_context(|| format!("no arena room for {name}"))?;
    reader.read(source)?;
    reader.close();

    log::info!("loaded {name}: {} bytes", source.len());
    Ok(source)
}
