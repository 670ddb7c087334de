//! Unspent output classification
//!
//! Every unspent output is exactly one of vote or normal. An output is a
//! vote output only when its transaction is version 0.9 or later and the
//! output is typed as a vote; everything else is normal.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::{OutputType, TX_VERSION_09};

/// Category of a single unspent output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputClass {
    Vote,
    Normal,
}

/// Listing filter requested by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UtxoFilter {
    /// No filter
    #[default]
    Mixed,
    Vote,
    Normal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid utxotype: {0}")]
pub struct InvalidFilter(pub String);

impl FromStr for UtxoFilter {
    type Err = InvalidFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mixed" => Ok(UtxoFilter::Mixed),
            "vote" => Ok(UtxoFilter::Vote),
            "normal" => Ok(UtxoFilter::Normal),
            other => Err(InvalidFilter(other.to_string())),
        }
    }
}

impl fmt::Display for UtxoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UtxoFilter::Mixed => "mixed",
            UtxoFilter::Vote => "vote",
            UtxoFilter::Normal => "normal",
        };
        f.write_str(name)
    }
}

impl UtxoFilter {
    pub fn admits(self, class: OutputClass) -> bool {
        match self {
            UtxoFilter::Mixed => true,
            UtxoFilter::Vote => class == OutputClass::Vote,
            UtxoFilter::Normal => class == OutputClass::Normal,
        }
    }
}

pub fn classify(tx_version: u8, output_type: OutputType) -> OutputClass {
    if tx_version >= TX_VERSION_09 && output_type == OutputType::Vote {
        OutputClass::Vote
    } else {
        OutputClass::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(TX_VERSION_09, OutputType::Vote), OutputClass::Vote);
        assert_eq!(classify(0x0a, OutputType::Vote), OutputClass::Vote);
        assert_eq!(classify(TX_VERSION_09, OutputType::Default), OutputClass::Normal);
        // A vote tag on a legacy transaction does not count
        assert_eq!(classify(0x00, OutputType::Vote), OutputClass::Normal);
    }

    #[test]
    fn test_filters_partition_classes() {
        for class in [OutputClass::Vote, OutputClass::Normal] {
            assert!(UtxoFilter::Mixed.admits(class));
            assert_ne!(
                UtxoFilter::Vote.admits(class),
                UtxoFilter::Normal.admits(class)
            );
        }
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!("vote".parse::<UtxoFilter>().unwrap(), UtxoFilter::Vote);
        assert_eq!("mixed".parse::<UtxoFilter>().unwrap(), UtxoFilter::Mixed);
        assert_eq!(UtxoFilter::default(), UtxoFilter::Mixed);
        assert_eq!(
            "VOTE".parse::<UtxoFilter>(),
            Err(InvalidFilter("VOTE".to_string()))
        );
        assert_eq!(UtxoFilter::Normal.to_string(), "normal");
    }
}
