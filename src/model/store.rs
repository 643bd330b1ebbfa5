use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use num::Num;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Result, TopicError};
use crate::model::artifact;
use crate::vectorizer::lsi::ColumnSource;
use crate::vectorizer::sparse::SparseVec;

/// Byte offsets of every record in a stored corpus
/// `offsets[i]..offsets[i + 1]` is document `i`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CorpusIndex {
    num_terms: u64,
    offsets: Vec<u64>,
}

/// Path of the random-access index that accompanies a corpus file
pub fn index_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".index");
    PathBuf::from(name)
}

/// Write a sequence of sparse vectors, in order, plus its index
///
/// # Arguments
/// * `path` - corpus file; the index goes to `index_path(path)`
/// * `num_terms` - width of the vector space
/// * `vectors` - documents in corpus order
///
/// # Returns
/// * `usize` - number of documents written
pub fn serialize<N, I>(path: &Path, num_terms: usize, vectors: I) -> Result<usize>
where
    N: Num + Copy + Serialize,
    I: IntoIterator<Item = Result<SparseVec<N>>>,
{
    let mut offsets = vec![0u64];
    artifact::write_atomic(path, |writer| {
        let mut pos = 0u64;
        for vec in vectors {
            let bytes = serde_cbor::to_vec(&vec?)?;
            writer.write_all(&bytes)?;
            pos += bytes.len() as u64;
            offsets.push(pos);
        }
        Ok(())
    })?;
    let num_docs = offsets.len() - 1;
    let index = CorpusIndex {
        num_terms: num_terms as u64,
        offsets,
    };
    artifact::save(&index_path(path), &index)?;
    Ok(num_docs)
}

/// A corpus persisted by `serialize`, read back lazily
#[derive(Debug, Clone)]
pub struct StoredCorpus<N> {
    path: PathBuf,
    index: CorpusIndex,
    _marker: PhantomData<N>,
}

impl<N> StoredCorpus<N>
where
    N: Num + Copy + DeserializeOwned,
{
    /// Open a stored corpus; both the data file and its index must exist
    pub fn open(path: &Path) -> Result<Self> {
        let index: CorpusIndex = artifact::load(&index_path(path))?;
        if !path.exists() {
            return Err(TopicError::MissingArtifact(path.to_path_buf()));
        }
        let ascending = index.offsets.windows(2).all(|w| w[0] <= w[1]);
        if index.offsets.first() != Some(&0) || !ascending {
            return Err(TopicError::CorruptArtifact {
                path: index_path(path),
                reason: "offsets must start at 0 and ascend".into(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            index,
            _marker: PhantomData,
        })
    }

    /// Number of documents
    #[inline]
    pub fn len(&self) -> usize {
        self.index.offsets.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of the vector space
    #[inline]
    pub fn num_terms(&self) -> usize {
        self.index.num_terms as usize
    }

    /// Random access to document `i`
    pub fn get(&self, i: usize) -> Result<Option<SparseVec<N>>> {
        if i >= self.len() {
            return Ok(None);
        }
        let start = self.index.offsets[i];
        let len = (self.index.offsets[i + 1] - start) as usize;
        let mut file = artifact::open(&self.path)?;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(Some(serde_cbor::from_slice(&buf)?))
    }

    /// Stream documents in corpus order
    pub fn iter(&self) -> Result<StoredCorpusIter<'_, N>> {
        let file = artifact::open(&self.path)?;
        Ok(StoredCorpusIter {
            reader: BufReader::new(file),
            bounds: self.index.offsets.windows(2),
            buf: Vec::new(),
            _marker: PhantomData,
        })
    }

    /// Read every document into memory
    pub fn load_all(&self) -> Result<Vec<SparseVec<N>>> {
        self.iter()?.collect()
    }
}

impl ColumnSource for StoredCorpus<f64> {
    fn num_columns(&self) -> usize {
        self.len()
    }

    fn for_each_chunk(
        &self,
        chunk_size: usize,
        f: &mut dyn FnMut(&[SparseVec<f64>]) -> Result<()>,
    ) -> Result<()> {
        let chunk_size = chunk_size.max(1);
        let mut chunk = Vec::with_capacity(chunk_size.min(self.len()));
        for column in self.iter()? {
            chunk.push(column?);
            if chunk.len() == chunk_size {
                f(&chunk)?;
                chunk.clear();
            }
        }
        if !chunk.is_empty() {
            f(&chunk)?;
        }
        Ok(())
    }
}

/// Sequential reader over a `StoredCorpus`
pub struct StoredCorpusIter<'a, N> {
    reader: BufReader<File>,
    bounds: std::slice::Windows<'a, u64>,
    buf: Vec<u8>,
    _marker: PhantomData<N>,
}

impl<'a, N> Iterator for StoredCorpusIter<'a, N>
where
    N: Num + Copy + DeserializeOwned,
{
    type Item = Result<SparseVec<N>>;

    fn next(&mut self) -> Option<Self::Item> {
        let bound = self.bounds.next()?;
        self.buf.resize((bound[1] - bound[0]) as usize, 0);
        if let Err(e) = self.reader.read_exact(&mut self.buf) {
            return Some(Err(e.into()));
        }
        Some(serde_cbor::from_slice(&self.buf).map_err(TopicError::from))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bounds.size_hint()
    }
}
