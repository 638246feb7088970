//! JSON wire format for the IBF and Strata estimator, plus a MinHash wire
//! format in the same shape.
//!
//! The source marshals these types directly via `MarshalJSON`/`UnmarshalJSON`
//! on the live structs. This crate instead keeps the wire shape as a
//! separate, serde-derived struct per type and converts through explicit
//! `to_wire`/`from_wire` methods; the live types never implement
//! `Serialize`/`Deserialize` themselves.

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};
use crate::ibf::Ibf;
use crate::minhash::MinHash;
use crate::strata::Strata;

/// On-the-wire representation of an [`Ibf`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbfWire {
    /// Number of cells.
    pub size: usize,
    /// Key width in bytes.
    pub keysize: usize,
    /// Per-cell hash accumulators, named `hashes` on the wire.
    #[serde(rename = "hashes")]
    pub hashes: Vec<u32>,
    /// Per-cell counts, named `counts` on the wire.
    #[serde(rename = "counts")]
    pub counts: Vec<i64>,
    /// The `keysum` buffer, lowercase hex, no separators, named `data` on the wire.
    #[serde(rename = "data")]
    pub data: String,
}

impl Ibf {
    /// Converts this filter to its wire representation.
    pub fn to_wire(&self) -> IbfWire {
        IbfWire {
            size: self.size(),
            keysize: self.keysize(),
            hashes: self.hashes().to_vec(),
            counts: self.counts().to_vec(),
            data: hex::encode(self.data()),
        }
    }

    /// Reconstructs a filter from its wire representation.
    ///
    /// Fails if the array lengths disagree with `size`/`keysize`, or if
    /// `data` isn't valid hex.
    pub fn from_wire(wire: &IbfWire) -> Result<Ibf> {
        let data = hex::decode(&wire.data)?;
        Ibf::from_parts(
            wire.size,
            wire.keysize,
            wire.hashes.clone(),
            wire.counts.clone(),
            data,
        )
    }

    /// Serializes this filter as JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_wire())?)
    }

    /// Deserializes a filter from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Ibf> {
        let wire: IbfWire = serde_json::from_slice(bytes)?;
        Ibf::from_wire(&wire)
    }
}

impl Strata {
    /// Serializes this estimator as a JSON array of IBF wire objects, in
    /// stratum order from shallowest (0) to deepest.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let wires: Vec<IbfWire> = self.ibfs().iter().map(Ibf::to_wire).collect();
        Ok(serde_json::to_vec(&wires)?)
    }

    /// Deserializes an estimator from its JSON array form.
    ///
    /// The resulting estimator's `cellsize`/`keysize` are read off the
    /// first stratum; every stratum's declared `size`/`keysize` must agree.
    pub fn from_json(bytes: &[u8]) -> Result<Strata> {
        let wires: Vec<IbfWire> = serde_json::from_slice(bytes)?;
        if wires.is_empty() {
            return Err(ReconcileError::WireLengthMismatch(
                "strata JSON array must contain at least one IBF".to_string(),
            ));
        }
        let cellsize = wires[0].size;
        let keysize = wires[0].keysize;
        for (level, wire) in wires.iter().enumerate() {
            if wire.size != cellsize || wire.keysize != keysize {
                return Err(ReconcileError::WireLengthMismatch(format!(
                    "stratum {level} has size/keysize {}/{}, expected {cellsize}/{keysize}",
                    wire.size, wire.keysize
                )));
            }
        }
        let ibfs = wires
            .iter()
            .map(Ibf::from_wire)
            .collect::<Result<Vec<_>>>()?;
        Ok(Strata::from_parts(cellsize, keysize, ibfs))
    }
}

/// On-the-wire representation of a [`MinHash`] signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinHashWire {
    /// Number of signature coordinates.
    pub hashcount: usize,
    /// Number of keys folded into the signature.
    pub keycount: usize,
    /// The signature coordinates themselves.
    pub signature: Vec<u32>,
}

impl MinHash {
    /// Converts this signature to its wire representation.
    pub fn to_wire(&self) -> MinHashWire {
        MinHashWire {
            hashcount: self.hashcount(),
            keycount: self.keycount(),
            signature: self.signature().to_vec(),
        }
    }

    /// Reconstructs a signature from its wire representation.
    pub fn from_wire(wire: &MinHashWire) -> Result<MinHash> {
        if wire.signature.len() != wire.hashcount {
            return Err(ReconcileError::WireLengthMismatch(format!(
                "signature length {} != declared hashcount {}",
                wire.signature.len(),
                wire.hashcount
            )));
        }
        Ok(MinHash::from_parts(wire.signature.clone(), wire.keycount))
    }

    /// Serializes this signature as JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_wire())?)
    }

    /// Deserializes a signature from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<MinHash> {
        let wire: MinHashWire = serde_json::from_slice(bytes)?;
        MinHash::from_wire(&wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ibf_json_round_trips() {
        let mut f = Ibf::new(16, 4);
        f.add(b"aaaa").unwrap();
        f.add(b"bbbb").unwrap();
        let bytes = f.to_json().unwrap();
        let back = Ibf::from_json(&bytes).unwrap();
        assert_eq!(f, back);
    }

    #[test]
    fn ibf_wire_rejects_bad_lengths() {
        let wire = IbfWire {
            size: 4,
            keysize: 4,
            hashes: vec![0, 0],
            counts: vec![0, 0, 0, 0],
            data: hex::encode(vec![0u8; 16]),
        };
        assert!(Ibf::from_wire(&wire).is_err());
    }

    #[test]
    fn ibf_wire_rejects_bad_hex() {
        let wire = IbfWire {
            size: 1,
            keysize: 1,
            hashes: vec![0],
            counts: vec![0],
            data: "zz".to_string(),
        };
        assert!(Ibf::from_wire(&wire).is_err());
    }

    #[test]
    fn strata_json_round_trips() {
        let mut s = Strata::new(40, 4, 6);
        s.add(b"aaaa").unwrap();
        s.add(b"bbbb").unwrap();
        s.add(b"cccc").unwrap();
        let bytes = s.to_json().unwrap();
        let back = Strata::from_json(&bytes).unwrap();
        assert_eq!(back.depth(), s.depth());
        assert_eq!(back.cellsize(), s.cellsize());
        for (a, b) in s.ibfs().iter().zip(back.ibfs()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn strata_json_rejects_size_drift_between_strata() {
        let mut s = Strata::new(40, 4, 3);
        s.add(b"aaaa").unwrap();
        let good = s.to_json().unwrap();
        let mut wires: Vec<IbfWire> = serde_json::from_slice(&good).unwrap();
        wires[1].size = 41;
        let bytes = serde_json::to_vec(&wires).unwrap();
        assert!(Strata::from_json(&bytes).is_err());
    }

    #[test]
    fn strata_json_rejects_keysize_drift_between_strata() {
        let mut s = Strata::new(40, 4, 3);
        s.add(b"aaaa").unwrap();
        let good = s.to_json().unwrap();
        let mut wires: Vec<IbfWire> = serde_json::from_slice(&good).unwrap();
        wires[2].keysize = 8;
        let bytes = serde_json::to_vec(&wires).unwrap();
        assert!(Strata::from_json(&bytes).is_err());
    }

    #[test]
    fn minhash_json_round_trips() {
        let mut m = MinHash::new(32);
        m.add(b"abcd");
        m.add(b"efgh");
        let bytes = m.to_json().unwrap();
        let back = MinHash::from_json(&bytes).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn minhash_wire_rejects_length_mismatch() {
        let wire = MinHashWire {
            hashcount: 4,
            keycount: 0,
            signature: vec![0, 0],
        };
        assert!(MinHash::from_wire(&wire).is_err());
    }
}
