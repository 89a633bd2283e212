//! Loading of the MNIST handwritten digit dataset from its IDX files.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use ann::training::{Dataset, Example, Image};

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;

pub const TRAIN_IMAGES: &str = "train-images.idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels.idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images.idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels.idx1-ubyte";

#[derive(Debug)]
pub enum MnistError {
    Io(io::Error),
    Magic { expected: u32, found: u32 },
    Truncated,
    CountMismatch { images: usize, labels: usize },
    IndexOutOfRange(usize),
}

impl From<io::Error> for MnistError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl fmt::Display for MnistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "could not read dataset file: {error}"),
            Self::Magic { expected, found } => {
                write!(f, "bad magic number: expected {expected}, found {found}")
            }
            Self::Truncated => write!(f, "dataset file is truncated"),
            Self::CountMismatch { images, labels } => {
                write!(f, "found {images} images but {labels} labels")
            }
            Self::IndexOutOfRange(index) => write!(f, "no example at index {index}"),
        }
    }
}

impl Error for MnistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            _ => None,
        }
    }
}

/// Images and labels decoded into memory.
#[derive(Clone, Debug)]
pub struct MnistDataset {
    rows: usize,
    columns: usize,
    pixels: Vec<u8>,
    labels: Vec<u8>,
}

impl MnistDataset {
    pub fn training_set(directory: impl AsRef<Path>) -> Result<Self, MnistError> {
        let directory = directory.as_ref();
        Self::from_files(directory.join(TRAIN_IMAGES), directory.join(TRAIN_LABELS))
    }

    pub fn test_set(directory: impl AsRef<Path>) -> Result<Self, MnistError> {
        let directory = directory.as_ref();
        Self::from_files(directory.join(TEST_IMAGES), directory.join(TEST_LABELS))
    }

    pub fn from_files(
        images: impl AsRef<Path>,
        labels: impl AsRef<Path>,
    ) -> Result<Self, MnistError> {
        debug!(
            images = %images.as_ref().display(),
            labels = %labels.as_ref().display(),
            "Loading MNIST files.",
        );
        Self::from_bytes(&fs::read(images)?, &fs::read(labels)?)
    }

    /// Decodes the contents of an IDX image file and an IDX label file.
    pub fn from_bytes(images: &[u8], labels: &[u8]) -> Result<Self, MnistError> {
        let mut image_reader = Reader::new(images);
        image_reader.magic(IMAGE_MAGIC)?;
        let image_count = image_reader.u32()? as usize;
        let rows = image_reader.u32()? as usize;
        let columns = image_reader.u32()? as usize;
        let pixel_count = image_count
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(columns))
            .ok_or(MnistError::Truncated)?;
        let pixels = image_reader.bytes(pixel_count)?.to_vec();

        let mut label_reader = Reader::new(labels);
        label_reader.magic(LABEL_MAGIC)?;
        let label_count = label_reader.u32()? as usize;
        let labels = label_reader.bytes(label_count)?.to_vec();

        if image_count != label_count {
            return Err(MnistError::CountMismatch {
                images: image_count,
                labels: label_count,
            });
        }

        debug!(count = image_count, rows, columns, "Decoded MNIST data.");

        Ok(Self {
            rows,
            columns,
            pixels,
            labels,
        })
    }

    /// Keeps at most the first `count` examples.
    pub fn limit(mut self, count: usize) -> Self {
        let count = count.min(self.labels.len());
        self.labels.truncate(count);
        self.pixels.truncate(count * self.image_size());
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn image_size(&self) -> usize {
        self.rows * self.columns
    }
}

impl Dataset for MnistDataset {
    type Error = MnistError;

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn example(&self, index: usize) -> Result<Example, Self::Error> {
        let label = *self
            .labels
            .get(index)
            .ok_or(MnistError::IndexOutOfRange(index))?;

        let size = self.image_size();
        let pixels = self.pixels[index * size..(index + 1) * size].to_vec();

        Ok(Example {
            image: Image::new(self.rows, self.columns, pixels),
            label: label as usize,
        })
    }
}

/// Big-endian cursor over an IDX file.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn bytes(&mut self, count: usize) -> Result<&'a [u8], MnistError> {
        let end = self
            .offset
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or(MnistError::Truncated)?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    fn u32(&mut self) -> Result<u32, MnistError> {
        let bytes = self.bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn magic(&mut self, expected: u32) -> Result<(), MnistError> {
        let found = self.u32()?;
        if found != expected {
            return Err(MnistError::Magic { expected, found });
        }
        Ok(())
    }
}
