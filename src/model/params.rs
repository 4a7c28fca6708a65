//! Named parameter tensors and weight loading
//!
//! Pretrained weights are stored as a JSON mapping from parameter name to a
//! flat tensor. Loading is non-strict: names in the file that the model does
//! not know are ignored, and model parameters missing from the file keep
//! their initialization and are reported so startup can warn about them.
//! Shape mismatches on names the model does use abort the load.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

use crate::error::{Error, Result};

/// A single serialized tensor: shape plus row-major data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorEntry {
    /// Tensor dimensions
    pub shape: Vec<usize>,
    /// Values in row-major order
    pub data: Vec<f64>,
}

impl TensorEntry {
    /// Serialize a vector parameter
    pub fn from_array1(array: &Array1<f64>) -> Self {
        Self {
            shape: vec![array.len()],
            data: array.to_vec(),
        }
    }

    /// Serialize a matrix parameter
    pub fn from_array2(array: &Array2<f64>) -> Self {
        Self {
            shape: vec![array.nrows(), array.ncols()],
            data: array.iter().cloned().collect(),
        }
    }
}

/// Named mapping of parameter tensors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamMap {
    tensors: HashMap<String, TensorEntry>,
}

impl ParamMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tensors in the map
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// All tensor names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Look up a tensor by name
    pub fn get(&self, name: &str) -> Option<&TensorEntry> {
        self.tensors.get(name)
    }

    /// Insert a vector parameter
    pub fn insert1(&mut self, name: &str, array: &Array1<f64>) {
        self.tensors
            .insert(name.to_string(), TensorEntry::from_array1(array));
    }

    /// Insert a matrix parameter
    pub fn insert2(&mut self, name: &str, array: &Array2<f64>) {
        self.tensors
            .insert(name.to_string(), TensorEntry::from_array2(array));
    }

    /// Load a parameter map from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let map: Self = serde_json::from_reader(file)?;
        Ok(map)
    }

    /// Save the parameter map to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(file, self)?;
        Ok(())
    }

    /// Rewrite names from the legacy export that carried a nested `.layer.`
    /// qualifier (`encoder.layer.0.` instead of `encoder.0.`)
    pub fn remap_legacy_keys(&self) -> Self {
        let tensors = self
            .tensors
            .iter()
            .map(|(name, entry)| (name.replace(".layer.", "."), entry.clone()))
            .collect();
        Self { tensors }
    }
}

/// Outcome of a non-strict weight load
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Number of parameters assigned from the map
    pub loaded: usize,
    /// Model parameters absent from the map, left at initialization
    pub missing: Vec<String>,
    /// Map names unknown to the model, ignored
    pub ignored: Vec<String>,
}

impl LoadReport {
    /// True when every model parameter received a value
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Visitor that walks the model's parameters against a map
pub(crate) struct ParamLoader<'a> {
    map: &'a ParamMap,
    used: HashSet<String>,
    loaded: usize,
    missing: Vec<String>,
}

impl<'a> ParamLoader<'a> {
    pub fn new(map: &'a ParamMap) -> Self {
        Self {
            map,
            used: HashSet::new(),
            loaded: 0,
            missing: Vec::new(),
        }
    }

    /// Assign a vector parameter if present, recording the outcome
    pub fn load1(&mut self, name: &str, target: &mut Array1<f64>) -> Result<()> {
        match self.map.get(name) {
            Some(entry) => {
                if entry.shape != [target.len()] {
                    return Err(Error::ShapeMismatch {
                        name: name.to_string(),
                        expected: vec![target.len()],
                        found: entry.shape.clone(),
                    });
                }
                if entry.data.len() != target.len() {
                    return Err(Error::Parse(format!(
                        "tensor `{}` has {} values for shape {:?}",
                        name,
                        entry.data.len(),
                        entry.shape
                    )));
                }
                *target = Array1::from_vec(entry.data.clone());
                self.used.insert(name.to_string());
                self.loaded += 1;
            }
            None => self.missing.push(name.to_string()),
        }
        Ok(())
    }

    /// Assign a matrix parameter if present, recording the outcome
    pub fn load2(&mut self, name: &str, target: &mut Array2<f64>) -> Result<()> {
        match self.map.get(name) {
            Some(entry) => {
                let expected = vec![target.nrows(), target.ncols()];
                if entry.shape != expected {
                    return Err(Error::ShapeMismatch {
                        name: name.to_string(),
                        expected,
                        found: entry.shape.clone(),
                    });
                }
                let array =
                    Array2::from_shape_vec((target.nrows(), target.ncols()), entry.data.clone())
                        .map_err(|e| {
                            Error::Parse(format!("tensor `{}` data mismatch: {}", name, e))
                        })?;
                *target = array;
                self.used.insert(name.to_string());
                self.loaded += 1;
            }
            None => self.missing.push(name.to_string()),
        }
        Ok(())
    }

    /// Finish the walk, collecting ignored names
    pub fn finish(self) -> LoadReport {
        let mut ignored: Vec<String> = self
            .map
            .names()
            .filter(|name| !self.used.contains(*name))
            .map(str::to_string)
            .collect();
        ignored.sort();

        LoadReport {
            loaded: self.loaded,
            missing: self.missing,
            ignored,
        }
    }
}
