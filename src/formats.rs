//! Readers and writers for embedding files.
//!
//! - GloVe/word2vec text: one `word v1 v2 ... vd` record per line, with an
//!   optional leading `vocab_size dims` header line.
//! - word2vec binary: `vocab_size dims\n` header, then per word the token
//!   bytes up to a space followed by `dims` little-endian f32 values
//!   (the format word2vec and gensim write).
//! - Native cache: a `.vocab` word list plus a flat `.vec` blob of the
//!   already-normalized vectors, so reloading a parsed model skips float
//!   parsing and normalization entirely. The blob is machine-local; do not
//!   move it between hosts of different endianness.

use byteorder::{LittleEndian, NativeEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::store::VectorStore;

/// Load a text-format embedding file.
pub fn load_text(path: &Path) -> Result<VectorStore> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut store: Option<VectorStore> = None;

    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();

        // gensim-style "vocab_size dims" header
        if index == 0 && rest.len() == 1 {
            if let (Ok(capacity), Ok(dims)) = (key.parse::<usize>(), rest[0].parse::<usize>()) {
                store = Some(VectorStore::with_capacity(dims, capacity));
                continue;
            }
        }

        let word = key.to_string();
        let values = parse_values(&word, &rest, index + 1)?;
        if store.is_none() && values.is_empty() {
            return Err(Error::InvalidVector(format!(
                "vector for '{word}' has zero dimensions"
            )));
        }
        let target = store.get_or_insert_with(|| VectorStore::with_capacity(values.len(), 1024));
        target.push(word, values)?;
    }

    match store {
        Some(store) if !store.is_empty() => Ok(store),
        _ => Err(Error::InvalidVector("no word vectors found".into())),
    }
}

fn parse_values(word: &str, fields: &[&str], line: usize) -> Result<Vec<f32>> {
    fields
        .iter()
        .map(|s| s.parse::<f32>())
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|_| Error::ParseFloat {
            word: word.to_string(),
            line,
        })
}

/// Load a word2vec binary file.
pub fn load_word2vec_binary(path: &Path) -> Result<VectorStore> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let header = read_line_bytes(&mut reader)?;
    let header = String::from_utf8_lossy(&header);
    let mut parts = header.split_whitespace();
    let (Some(vocab), Some(dims)) = (parts.next(), parts.next()) else {
        return Err(Error::InvalidVector(format!(
            "bad word2vec binary header: '{}'",
            header.trim()
        )));
    };
    let vocab: usize = vocab.parse().map_err(|_| Error::ParseFloat {
        word: "vocab_size".into(),
        line: 1,
    })?;
    let dims: usize = dims.parse().map_err(|_| Error::ParseFloat {
        word: "dims".into(),
        line: 1,
    })?;
    if dims == 0 {
        return Err(Error::InvalidVector("binary header declares 0 dims".into()));
    }

    let mut store = VectorStore::with_capacity(dims, vocab);
    let mut values = vec![0.0f32; dims];
    for _ in 0..vocab {
        let word = read_token(&mut reader)?;
        reader.read_f32_into::<LittleEndian>(&mut values)?;
        store.push(word, values.clone())?;
    }

    if store.is_empty() {
        return Err(Error::InvalidVector("no word vectors found".into()));
    }
    Ok(store)
}

fn read_line_bytes<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        if byte[0] == b'\n' {
            return Ok(bytes);
        }
        bytes.push(byte[0]);
    }
}

// Token bytes run up to the next space; leading newlines left over from the
// previous record's float block are skipped.
fn read_token<R: Read>(reader: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        match byte[0] {
            b' ' if !bytes.is_empty() => break,
            b'\n' | b'\r' | b' ' => continue,
            b => bytes.push(b),
        }
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Persist a parsed store as vocab list + flat vector blob.
pub fn write_native_cache(store: &VectorStore, vocab_path: &Path, vec_path: &Path) -> Result<()> {
    let mut vocab_out = BufWriter::new(File::create(vocab_path)?);
    for word in store.words() {
        writeln!(vocab_out, "{word}")?;
    }
    vocab_out.flush()?;

    let mut vec_out = BufWriter::new(File::create(vec_path)?);
    vec_out.write_u64::<NativeEndian>(store.len() as u64)?;
    vec_out.write_u64::<NativeEndian>(store.dims() as u64)?;
    vec_out.write_all(bytemuck::cast_slice(store.flat()))?;
    vec_out.flush()?;
    Ok(())
}

/// Load a store previously written by [`write_native_cache`].
pub fn load_native_cache(vocab_path: &Path, vec_path: &Path) -> Result<VectorStore> {
    let vocab_file = BufReader::new(File::open(vocab_path)?);
    let words = vocab_file
        .lines()
        .collect::<std::io::Result<Vec<String>>>()?;

    let mut vec_in = BufReader::new(File::open(vec_path)?);
    let count = vec_in.read_u64::<NativeEndian>()? as usize;
    let dims = vec_in.read_u64::<NativeEndian>()? as usize;
    if count != words.len() {
        return Err(Error::InvalidVector(format!(
            "cache header declares {count} words but vocab file has {}",
            words.len()
        )));
    }

    let mut flat = vec![0.0f32; count * dims];
    match vec_in.read_exact(bytemuck::cast_slice_mut(&mut flat)) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            return Err(Error::InvalidVector("truncated vector cache".into()));
        }
        Err(e) => return Err(e.into()),
    }

    VectorStore::from_flat(words, flat, dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_text(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn text_roundtrip() {
        let dir = tempdir().unwrap();
        let path = write_text(
            dir.path(),
            "vectors.txt",
            "king 1.0 0.0\nqueen 0.8 0.6\n",
        );
        let store = load_text(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.dims(), 2);
        let v = store.lookup("queen").unwrap();
        // rows come back unit-normalized
        assert!((v[0] - 0.8).abs() < 1e-6 && (v[1] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn text_with_gensim_header() {
        let dir = tempdir().unwrap();
        let path = write_text(dir.path(), "v.txt", "2 3\na 1 0 0\nb 0 1 0\n");
        let store = load_text(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.dims(), 3);
    }

    #[test]
    fn text_dimension_mismatch() {
        let dir = tempdir().unwrap();
        let path = write_text(dir.path(), "v.txt", "a 1 0 0\nb 0 1\n");
        assert!(matches!(
            load_text(&path),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn text_bad_float() {
        let dir = tempdir().unwrap();
        let path = write_text(dir.path(), "v.txt", "a 1 zebra\n");
        assert!(matches!(load_text(&path), Err(Error::ParseFloat { .. })));
    }

    #[test]
    fn binary_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        {
            let mut out = std::fs::File::create(&path).unwrap();
            out.write_all(b"2 3\n").unwrap();
            out.write_all(b"king ").unwrap();
            for v in [1.0f32, 0.0, 0.0] {
                out.write_f32::<LittleEndian>(v).unwrap();
            }
            out.write_all(b"\n").unwrap();
            out.write_all(b"queen ").unwrap();
            for v in [0.0f32, 1.0, 0.0] {
                out.write_f32::<LittleEndian>(v).unwrap();
            }
            out.write_all(b"\n").unwrap();
        }
        let store = load_word2vec_binary(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.dims(), 3);
        let v = store.lookup("queen").unwrap();
        assert!((v[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn native_cache_roundtrip() {
        let dir = tempdir().unwrap();
        let source = write_text(dir.path(), "v.txt", "a 1 0\nb 3 4\n");
        let store = load_text(&source).unwrap();

        let vocab = dir.path().join("v.vocab");
        let blob = dir.path().join("v.vec");
        write_native_cache(&store, &vocab, &blob).unwrap();

        let reloaded = load_native_cache(&vocab, &blob).unwrap();
        assert_eq!(reloaded.len(), store.len());
        assert_eq!(reloaded.dims(), store.dims());
        assert_eq!(reloaded.lookup("b").unwrap(), store.lookup("b").unwrap());
    }

    #[test]
    fn truncated_cache_is_rejected() {
        let dir = tempdir().unwrap();
        let source = write_text(dir.path(), "v.txt", "a 1 0\nb 3 4\n");
        let store = load_text(&source).unwrap();

        let vocab = dir.path().join("v.vocab");
        let blob = dir.path().join("v.vec");
        write_native_cache(&store, &vocab, &blob).unwrap();

        let bytes = std::fs::read(&blob).unwrap();
        std::fs::write(&blob, &bytes[..bytes.len() - 4]).unwrap();
        assert!(matches!(
            load_native_cache(&vocab, &blob),
            Err(Error::InvalidVector(_))
        ));
    }
}
