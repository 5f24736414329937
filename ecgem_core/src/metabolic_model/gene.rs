//! This module provides the Gene struct, representing a gene, and the GPR enum, representing a
//! gene protein reaction rule
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;
use thiserror::Error;

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the gene
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Gene Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
}

impl Gene {
    /// Create a gene with only an id
    pub fn new(id: &str) -> Gene {
        Gene {
            id: id.to_string(),
            name: None,
            notes: None,
            annotation: None,
        }
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Representation of a Gene Protein Reaction Rule as an AST
///
/// Operation nodes hold any number of children. Children of an operation are never the same
/// operation as their parent, `(a or b) or c` is held as a single `Or` with three children.
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// A terminal gene node, holding the gene id
    Gene(String),
    /// All children are required
    And(Vec<Gpr>),
    /// Any one child is sufficient
    Or(Vec<Gpr>),
}

/// Types of Allowed GPR Operations
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GprOperatorType {
    Or,
    And,
}

impl Gpr {
    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::Gene(gene.to_string())
    }

    /// Create a new operation node over `operands`
    ///
    /// Operands which are themselves the same operation are merged into the new node, and an
    /// operation over a single operand collapses to that operand.
    pub fn new_operation(operator: GprOperatorType, operands: Vec<Gpr>) -> Result<Gpr, GprError> {
        let mut children = Vec::with_capacity(operands.len());
        for operand in operands {
            match (operator, operand) {
                (GprOperatorType::And, Gpr::And(inner)) | (GprOperatorType::Or, Gpr::Or(inner)) => {
                    children.extend(inner)
                }
                (_, other) => children.push(other),
            }
        }
        match children.len() {
            0 => Err(GprError::EmptyOperation),
            1 => Ok(children.remove(0)),
            _ => Ok(match operator {
                GprOperatorType::And => Gpr::And(children),
                GprOperatorType::Or => Gpr::Or(children),
            }),
        }
    }

    /// Create the conjunction of a list of genes (`None` if the list is empty)
    pub fn conjunction<S: AsRef<str>>(genes: &[S]) -> Option<Gpr> {
        let nodes = genes
            .iter()
            .map(|g| Gpr::new_gene_node(g.as_ref()))
            .collect();
        Gpr::new_operation(GprOperatorType::And, nodes).ok()
    }

    /// Ids of every gene in the rule, in order of first appearance
    pub fn genes(&self) -> Vec<String> {
        let mut genes = Vec::new();
        self.collect_genes(&mut genes);
        genes
    }

    fn collect_genes(&self, genes: &mut Vec<String>) {
        match self {
            Gpr::Gene(id) => {
                if !genes.contains(id) {
                    genes.push(id.clone())
                }
            }
            Gpr::And(children) | Gpr::Or(children) => {
                children.iter().for_each(|c| c.collect_genes(genes))
            }
        }
    }

    /// Split the rule into its alternative clauses, each clause being the genes which must all
    /// be present for that alternative
    ///
    /// Only flat rules (an `or` of `and`s) can be split, an `or` nested inside an `and` returns
    /// [`GprError::NestedGrouping`].
    ///
    /// # Examples
    /// ```rust
    /// use indexmap::IndexMap;
    /// use ecgem_core::io::gpr_parse::parse_gpr;
    /// let mut gene_map = IndexMap::new();
    /// let gpr = parse_gpr("(b0001 and b0002) or b0003", &mut gene_map).unwrap();
    /// let clauses = gpr.clauses().unwrap();
    /// assert_eq!(clauses, vec![vec!["b0001", "b0002"], vec!["b0003"]]);
    /// ```
    pub fn clauses(&self) -> Result<Vec<Vec<String>>, GprError> {
        match self {
            Gpr::Or(children) => {
                let mut clauses = Vec::with_capacity(children.len());
                for child in children {
                    match child {
                        Gpr::Or(_) => clauses.extend(child.clauses()?),
                        _ => clauses.push(child.conjunction_genes()?),
                    }
                }
                Ok(clauses)
            }
            _ => Ok(vec![self.conjunction_genes()?]),
        }
    }

    /// Genes of a node made only of `and` operations
    fn conjunction_genes(&self) -> Result<Vec<String>, GprError> {
        match self {
            Gpr::Gene(id) => Ok(vec![id.clone()]),
            Gpr::And(children) => {
                let mut genes: Vec<String> = Vec::new();
                for child in children {
                    for gene in child.conjunction_genes()? {
                        if !genes.contains(&gene) {
                            genes.push(gene);
                        }
                    }
                }
                Ok(genes)
            }
            Gpr::Or(_) => Err(GprError::NestedGrouping(self.to_string_id())),
        }
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Gene(id) => id.clone(),
            Gpr::And(children) => Gpr::join(children, " and "),
            Gpr::Or(children) => Gpr::join(children, " or "),
        }
    }

    fn join(children: &[Gpr], separator: &str) -> String {
        children
            .iter()
            .map(|c| match c {
                Gpr::Gene(id) => id.clone(),
                _ => format!("({})", c.to_string_id()),
            })
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GprError {
    #[error("An operation requires at least one operand")]
    EmptyOperation,
    #[error("Rule `{0}` nests an `or` inside an `and`, only flat rules can be split")]
    NestedGrouping(String),
}
