use super::{Population, SnapshotError};

use ron::ser::PrettyConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

impl<C, H, G> Population<C, H, G>
where
    C: Serialize,
    H: Serialize,
    G: Serialize,
{
    /// Serializes the whole population (genomes, species,
    /// innovation history, generation counter and random
    /// generator state) as RON.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode(self)
    }

    /// Writes a snapshot of the population to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

impl<C, H, G> Population<C, H, G>
where
    C: DeserializeOwned,
    H: DeserializeOwned,
    G: DeserializeOwned,
{
    /// Restores a population from bytes produced by [`to_bytes`].
    ///
    /// # Errors
    /// Returns [`SnapshotError::Corrupt`] if the bytes can't be
    /// decoded, or if the decoded species don't partition the
    /// genomes exactly.
    ///
    /// [`to_bytes`]: Population::to_bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Population<C, H, G>, SnapshotError> {
        let population: Population<C, H, G> = decode(bytes)?;
        population.check_partition()?;
        Ok(population)
    }

    /// Restores a population from the snapshot at `path`.
    ///
    /// # Errors
    /// A missing file is reported as [`SnapshotError::NotFound`],
    /// never silently replaced by a fresh population.
    pub fn load(path: impl AsRef<Path>) -> Result<Population<C, H, G>, SnapshotError> {
        Self::from_bytes(&read(path.as_ref())?)
    }

    fn check_partition(&self) -> Result<(), SnapshotError> {
        let mut seen = BTreeSet::new();
        for id in self.species.iter().flat_map(|s| s.members.iter()) {
            if !self.genomes.contains_key(id) || !seen.insert(*id) {
                return Err(SnapshotError::Corrupt(format!(
                    "genome {} is missing or assigned to several species",
                    id
                )));
            }
        }
        if seen.len() != self.genomes.len() {
            return Err(SnapshotError::Corrupt(format!(
                "{} genomes belong to no species",
                self.genomes.len() - seen.len()
            )));
        }
        Ok(())
    }
}

/// Writes a single genome, e.g. the best of a run, to `path`.
pub fn save_genome<G: Serialize>(genome: &G, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
    fs::write(path, encode(genome)?)?;
    Ok(())
}

/// Reads a single genome written by [`save_genome`].
pub fn load_genome<G: DeserializeOwned>(path: impl AsRef<Path>) -> Result<G, SnapshotError> {
    decode(&read(path.as_ref())?)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SnapshotError> {
    ron::ser::to_string_pretty(value, PrettyConfig::default())
        .map(String::into_bytes)
        .map_err(|e| SnapshotError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SnapshotError> {
    ron::de::from_bytes(bytes).map_err(|e| SnapshotError::Corrupt(e.to_string()))
}

fn read(path: &Path) -> Result<Vec<u8>, SnapshotError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SnapshotError::NotFound(path.to_path_buf()),
        _ => SnapshotError::Io(e),
    })
}
