//! Sample sets returned by samplers
//!
//! A sample set holds one record per distinct read (or per read, in raw
//! answer mode): the assignment, its energy and how often it occurred.
//! Raw batch results are cached as the serde JSON form of this type and
//! aggregated results are written as CSV.

use crate::qubo::{BinaryQuadraticModel, Label, Vartype};
use crate::{RcmError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// Render a float in the spelling used by CSV cells and cache file names
///
/// Whole numbers keep one decimal place (`1.0`). Values with a decimal
/// exponent below -4 or from 16 up use scientific notation with a signed,
/// at least two-digit exponent (`1e-05`, `1.5e+16`). Everything else is the
/// shortest decimal that round-trips.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let exponent = scientific
        .split_once('e')
        .and_then(|(mantissa, exponent)| Some((mantissa, exponent.parse::<i32>().ok()?)));

    match exponent {
        Some((mantissa, exponent)) if !(-4..16).contains(&exponent) => {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        _ => {
            let plain = value.to_string();
            if plain.contains('.') {
                plain
            } else {
                format!("{}.0", plain)
            }
        }
    }
}

/// One returned assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Values in the order of the sample set's variables
    pub sample: Vec<i8>,
    /// Energy of the assignment
    pub energy: f64,
    /// Number of reads that returned this assignment
    pub num_occurrences: u64,
    /// Fraction of broken chains, for unembedded results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_break_fraction: Option<f64>,
}

/// Collection of sampled assignments over a fixed variable order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "V: Label")]
pub struct SampleSet<V> {
    variables: Vec<V>,
    vartype: Vartype,
    records: Vec<SampleRecord>,
    #[serde(default)]
    info: BTreeMap<String, serde_json::Value>,
}

impl<V: Label> SampleSet<V> {
    /// Create an empty sample set
    pub fn new(variables: Vec<V>, vartype: Vartype) -> Self {
        Self {
            variables,
            vartype,
            records: Vec::new(),
            info: BTreeMap::new(),
        }
    }

    /// Build a raw sample set from assignments, computing energies from `bqm`
    pub fn from_samples(
        bqm: &BinaryQuadraticModel<V>,
        variables: Vec<V>,
        samples: Vec<Vec<i8>>,
    ) -> Result<Self> {
        let mut set = Self::new(variables, bqm.vartype());
        let position: HashMap<V, usize> = set
            .variables
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();

        if let Some(v) = bqm.variables().find(|v| !position.contains_key(v)) {
            return Err(RcmError::sampler_error(format!(
                "model variable {} missing from the sample variables",
                v
            )));
        }

        for sample in samples {
            if sample.len() != set.variables.len() {
                return Err(RcmError::sampler_error(format!(
                    "sample has {} values for {} variables",
                    sample.len(),
                    set.variables.len()
                )));
            }
            let energy = bqm.energy(|v| sample[position[&v]]);
            set.push(SampleRecord {
                sample,
                energy,
                num_occurrences: 1,
                chain_break_fraction: None,
            })?;
        }

        Ok(set)
    }

    /// Append a record after checking its shape and values
    pub fn push(&mut self, record: SampleRecord) -> Result<()> {
        if record.sample.len() != self.variables.len() {
            return Err(RcmError::sampler_error(format!(
                "sample has {} values for {} variables",
                record.sample.len(),
                self.variables.len()
            )));
        }
        if let Some(&value) = record.sample.iter().find(|&&x| !self.vartype.contains(x)) {
            return Err(RcmError::sampler_error(format!(
                "value {} is not {}",
                value, self.vartype
            )));
        }

        self.records.push(record);
        Ok(())
    }

    /// Variables in column order
    pub fn variables(&self) -> &[V] {
        &self.variables
    }

    /// Sample vartype
    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    /// All records
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of reads represented
    pub fn num_reads(&self) -> u64 {
        self.records.iter().map(|r| r.num_occurrences).sum()
    }

    /// Lowest-energy record
    pub fn lowest(&self) -> Option<&SampleRecord> {
        self.records
            .iter()
            .min_by(|a, b| a.energy.total_cmp(&b.energy))
    }

    /// Free-form solver information
    pub fn info(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.info
    }

    /// Attach a solver information entry
    pub fn set_info(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.info.insert(key.into(), value);
    }

    /// Merge identical assignments, summing their occurrences
    ///
    /// Records keep the order in which each assignment first appeared.
    pub fn aggregate(&self) -> Self {
        let mut merged: Vec<SampleRecord> = Vec::new();
        let mut seen: HashMap<&[i8], usize> = HashMap::new();

        for record in &self.records {
            match seen.get(record.sample.as_slice()) {
                Some(&i) => merged[i].num_occurrences += record.num_occurrences,
                None => {
                    seen.insert(record.sample.as_slice(), merged.len());
                    merged.push(record.clone());
                }
            }
        }

        Self {
            variables: self.variables.clone(),
            vartype: self.vartype,
            records: merged,
            info: self.info.clone(),
        }
    }

    /// Concatenate sample sets over the same variables, in order
    ///
    /// Later sets may list their variables in a different order; their
    /// columns are permuted to match the first set.
    pub fn concatenate(sets: &[SampleSet<V>]) -> Result<Self> {
        let first = sets
            .first()
            .ok_or_else(|| RcmError::sampler_error("cannot concatenate zero sample sets"))?;
        let mut combined = Self::new(first.variables.clone(), first.vartype);
        let position: HashMap<V, usize> = first
            .variables
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();

        for set in sets {
            if set.vartype != first.vartype {
                return Err(RcmError::sampler_error("sample sets have different vartypes"));
            }
            if set.variables.len() != first.variables.len()
                || set.variables.iter().any(|v| !position.contains_key(v))
            {
                return Err(RcmError::sampler_error("sample sets have different variables"));
            }

            if set.variables == first.variables {
                combined.records.extend(set.records.iter().cloned());
                continue;
            }

            for record in &set.records {
                let mut sample = vec![0; record.sample.len()];
                for (value, v) in record.sample.iter().zip(&set.variables) {
                    sample[position[v]] = *value;
                }
                combined.records.push(SampleRecord { sample, ..record.clone() });
            }
        }

        Ok(combined)
    }

    /// Parse the JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let set: Self = serde_json::from_str(json)?;
        for record in &set.records {
            if record.sample.len() != set.variables.len() {
                return Err(RcmError::serialization_error(
                    "sample length does not match variables",
                ));
            }
        }
        Ok(set)
    }

    /// Render the JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the set as CSV with a header row and no index column
    ///
    /// Columns are the variables followed by `energy`, `num_occurrences` and,
    /// when any record carries one, `chain_break_fraction`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let with_breaks = self.records.iter().any(|r| r.chain_break_fraction.is_some());
        let mut csv = csv::Writer::from_writer(writer);

        let mut header: Vec<String> = self.variables.iter().map(|v| v.to_string()).collect();
        header.push("energy".to_string());
        header.push("num_occurrences".to_string());
        if with_breaks {
            header.push("chain_break_fraction".to_string());
        }
        csv.write_record(&header)?;

        for record in &self.records {
            let mut row: Vec<String> = record.sample.iter().map(|x| x.to_string()).collect();
            row.push(format_float(record.energy));
            row.push(record.num_occurrences.to_string());
            if with_breaks {
                row.push(format_float(record.chain_break_fraction.unwrap_or(0.0)));
            }
            csv.write_record(&row)?;
        }

        csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::Variable;

    fn model() -> BinaryQuadraticModel<Variable> {
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        bqm.add_variable(Variable(0), 1.0);
        bqm.add_interaction(Variable(0), Variable(1), -2.0);
        bqm
    }

    fn set(samples: Vec<Vec<i8>>) -> SampleSet<Variable> {
        SampleSet::from_samples(&model(), vec![Variable(0), Variable(1)], samples).unwrap()
    }

    #[test]
    fn test_energies_computed() {
        let set = set(vec![vec![1, 1], vec![1, 0], vec![0, 0]]);
        let energies: Vec<f64> = set.records().iter().map(|r| r.energy).collect();
        assert_eq!(energies, vec![-1.0, 1.0, 0.0]);
        assert_eq!(set.lowest().unwrap().sample, vec![1, 1]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let variables = vec![Variable(0), Variable(1)];
        let err = SampleSet::from_samples(&model(), variables, vec![vec![1, -1]]);
        assert!(err.is_err());
    }

    #[test]
    fn test_aggregate() {
        let set = set(vec![vec![1, 1], vec![0, 0], vec![1, 1]]).aggregate();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].num_occurrences, 2);
        assert_eq!(set.num_reads(), 3);
    }

    #[test]
    fn test_concatenate_keeps_order() {
        let a = set(vec![vec![1, 1]]);
        let b = set(vec![vec![0, 0], vec![1, 0]]);
        let combined = SampleSet::concatenate(&[a, b]).unwrap();

        let samples: Vec<&[i8]> = combined.records().iter().map(|r| r.sample.as_slice()).collect();
        assert_eq!(samples, vec![&[1, 1][..], &[0, 0][..], &[1, 0][..]]);
    }

    #[test]
    fn test_concatenate_permutes_columns() {
        let a = set(vec![vec![1, 0]]);
        let mut b = SampleSet::new(vec![Variable(1), Variable(0)], Vartype::Binary);
        b.push(SampleRecord {
            sample: vec![1, 0],
            energy: 0.0,
            num_occurrences: 1,
            chain_break_fraction: None,
        })
        .unwrap();

        let combined = SampleSet::concatenate(&[a, b]).unwrap();
        assert_eq!(combined.records()[1].sample, vec![0, 1]);
    }

    #[test]
    fn test_concatenate_rejects_mismatch() {
        let a = set(vec![vec![1, 1]]);
        let b = SampleSet::new(vec![Variable(0), Variable(2)], Vartype::Binary);
        assert!(SampleSet::concatenate(&[a, b]).is_err());
        assert!(SampleSet::<Variable>::concatenate(&[]).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut original = set(vec![vec![1, 0], vec![0, 1]]);
        original.set_info("num_sweeps", serde_json::json!(10));
        let parsed = SampleSet::<Variable>::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_csv_layout() {
        let mut buffer = Vec::new();
        set(vec![vec![1, 1], vec![0, 1]]).write_csv(&mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "0,1,energy,num_occurrences\n1,1,-1.0,1\n0,1,0.0,1\n");
    }

    #[test]
    fn test_csv_float_cells() {
        let mut set = SampleSet::new(vec![Variable(0)], Vartype::Binary);
        set.push(SampleRecord {
            sample: vec![1],
            energy: -2.5e-7,
            num_occurrences: 3,
            chain_break_fraction: Some(0.0),
        })
        .unwrap();
        set.push(SampleRecord {
            sample: vec![0],
            energy: 4.0,
            num_occurrences: 1,
            chain_break_fraction: Some(0.5),
        })
        .unwrap();

        let mut buffer = Vec::new();
        set.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "0,energy,num_occurrences,chain_break_fraction\n1,-2.5e-07,3,0.0\n0,4.0,1,0.5\n"
        );
    }

    #[test]
    fn test_float_spelling() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-1.0), "-1.0");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(0.5), "0.5");
        assert_eq!(format_float(1.25), "1.25");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(1e-5), "1e-05");
        assert_eq!(format_float(1e15), "1000000000000000.0");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e16), "1.5e+16");
        assert_eq!(format_float(1e100), "1e+100");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }
}
