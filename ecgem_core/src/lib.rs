//! Core rust implementation of ecgem, a crate for building enzyme constrained metabolic models.
//!
//! A genome scale metabolic model is read from COBRA JSON, its reversible reactions are split,
//! reactions with alternative catalysts are expanded into one reaction per isozyme, and every
//! catalyzed reaction is given an enzyme cost drawn from a shared protein budget. Costs come from
//! turnover numbers and protein masses in the annotation tables, or from the average cost when a
//! reaction has no evidence.

pub mod annotation;
pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod transform;
