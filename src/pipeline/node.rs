// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Pipeline nodes
//!
//! A node wraps one function together with the dataset names it reads and
//! writes. The mapping between datasets and function parameters is fixed when
//! the node is built and never re-inspected while running.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::errors::{FlowError, FlowResult, NotFoundReason};

/// Return type of node functions
pub type NodeResult = anyhow::Result<Value>;

type PositionalFn = Arc<dyn Fn(Vec<Value>) -> NodeResult + Send + Sync>;
type KeyedFn = Arc<dyn Fn(Map<String, Value>) -> NodeResult + Send + Sync>;

/// Source of input values for [`Node::invoke`]
pub trait ValueProvider {
    /// Current value of the named dataset
    fn value(&self, name: &str) -> FlowResult<Value>;
}

impl ValueProvider for BTreeMap<String, Value> {
    fn value(&self, name: &str) -> FlowResult<Value> {
        self.get(name).cloned().ok_or_else(|| not_registered(name))
    }
}

impl ValueProvider for HashMap<String, Value> {
    fn value(&self, name: &str) -> FlowResult<Value> {
        self.get(name).cloned().ok_or_else(|| not_registered(name))
    }
}

fn not_registered(name: &str) -> FlowError {
    FlowError::DatasetNotFound {
        name: name.to_string(),
        reason: NotFoundReason::NotRegistered,
    }
}

/// A node function with its calling convention
#[derive(Clone)]
pub struct NodeFn {
    kind: FnKind,
}

#[derive(Clone)]
enum FnKind {
    Positional { arity: usize, call: PositionalFn },
    Keyed { params: Vec<String>, call: KeyedFn },
}

/// Arguments gathered for a call
enum Args {
    Positional(Vec<Value>),
    Keyed(Map<String, Value>),
}

impl NodeFn {
    fn positional<F>(arity: usize, call: F) -> Self
    where
        F: Fn(Vec<Value>) -> NodeResult + Send + Sync + 'static,
    {
        Self {
            kind: FnKind::Positional {
                arity,
                call: Arc::new(call),
            },
        }
    }

    /// Function taking no inputs
    pub fn nullary<F>(f: F) -> Self
    where
        F: Fn() -> NodeResult + Send + Sync + 'static,
    {
        Self::positional(0, move |_| f())
    }

    /// Function taking one input
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(Value) -> NodeResult + Send + Sync + 'static,
    {
        Self::positional(1, move |args| {
            let [a]: [Value; 1] = expect_args(args)?;
            f(a)
        })
    }

    /// Function taking two inputs
    pub fn binary<F>(f: F) -> Self
    where
        F: Fn(Value, Value) -> NodeResult + Send + Sync + 'static,
    {
        Self::positional(2, move |args| {
            let [a, b]: [Value; 2] = expect_args(args)?;
            f(a, b)
        })
    }

    /// Function taking three inputs
    pub fn ternary<F>(f: F) -> Self
    where
        F: Fn(Value, Value, Value) -> NodeResult + Send + Sync + 'static,
    {
        Self::positional(3, move |args| {
            let [a, b, c]: [Value; 3] = expect_args(args)?;
            f(a, b, c)
        })
    }

    /// Function taking exactly `arity` inputs as a slice
    pub fn variadic<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&[Value]) -> NodeResult + Send + Sync + 'static,
    {
        Self::positional(arity, move |args| f(args.as_slice()))
    }

    /// Function taking its inputs as an object keyed by parameter name
    pub fn keyed<I, S, F>(params: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Map<String, Value>) -> NodeResult + Send + Sync + 'static,
    {
        Self {
            kind: FnKind::Keyed {
                params: params.into_iter().map(Into::into).collect(),
                call: Arc::new(f),
            },
        }
    }

    fn call(&self, args: Args) -> NodeResult {
        match (&self.kind, args) {
            (FnKind::Positional { call, .. }, Args::Positional(values)) => call(values),
            (FnKind::Keyed { call, .. }, Args::Keyed(values)) => call(values),
            _ => anyhow::bail!("argument style does not match the function"),
        }
    }
}

fn expect_args<const N: usize>(args: Vec<Value>) -> anyhow::Result<[Value; N]> {
    let got = args.len();
    args.try_into()
        .map_err(|_| anyhow::anyhow!("expected {} arguments, got {}", N, got))
}

impl fmt::Debug for NodeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FnKind::Positional { arity, .. } => write!(f, "NodeFn(positional/{})", arity),
            FnKind::Keyed { params, .. } => write!(f, "NodeFn(keyed {:?})", params),
        }
    }
}

/// Declared inputs of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeInputs {
    /// Datasets passed positionally
    Positional(Vec<String>),
    /// `(parameter, dataset)` pairs passed as a keyed object
    Named(Vec<(String, String)>),
}

impl NodeInputs {
    /// No inputs
    pub fn none() -> Self {
        Self::Positional(Vec::new())
    }

    /// Inputs bound to named parameters
    pub fn named<I, P, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, D)>,
        P: Into<String>,
        D: Into<String>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(p, d)| (p.into(), d.into()))
                .collect(),
        )
    }

    /// Dataset names in declaration order
    pub fn datasets(&self) -> Vec<&str> {
        match self {
            Self::Positional(names) => names.iter().map(String::as_str).collect(),
            Self::Named(pairs) => pairs.iter().map(|(_, d)| d.as_str()).collect(),
        }
    }

    fn rename(&self, f: &dyn Fn(&str) -> String) -> Self {
        match self {
            Self::Positional(names) => Self::Positional(names.iter().map(|n| f(n)).collect()),
            Self::Named(pairs) => {
                Self::Named(pairs.iter().map(|(p, d)| (p.clone(), f(d))).collect())
            }
        }
    }
}

impl From<&str> for NodeInputs {
    fn from(name: &str) -> Self {
        Self::Positional(vec![name.to_string()])
    }
}

impl From<String> for NodeInputs {
    fn from(name: String) -> Self {
        Self::Positional(vec![name])
    }
}

impl<const N: usize> From<[&str; N]> for NodeInputs {
    fn from(names: [&str; N]) -> Self {
        Self::Positional(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for NodeInputs {
    fn from(names: Vec<String>) -> Self {
        Self::Positional(names)
    }
}

/// Declared outputs of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutputs {
    /// Datasets filled from a single value or an array of values
    Positional(Vec<String>),
    /// `(key, dataset)` pairs filled from an object
    Keyed(Vec<(String, String)>),
}

impl NodeOutputs {
    /// No outputs; the function must return `null`
    pub fn none() -> Self {
        Self::Positional(Vec::new())
    }

    /// Outputs taken from keys of a returned object
    pub fn keyed<I, K, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: Into<String>,
    {
        Self::Keyed(
            pairs
                .into_iter()
                .map(|(k, d)| (k.into(), d.into()))
                .collect(),
        )
    }

    /// Dataset names in declaration order
    pub fn datasets(&self) -> Vec<&str> {
        match self {
            Self::Positional(names) => names.iter().map(String::as_str).collect(),
            Self::Keyed(pairs) => pairs.iter().map(|(_, d)| d.as_str()).collect(),
        }
    }

    fn rename(&self, f: &dyn Fn(&str) -> String) -> Self {
        match self {
            Self::Positional(names) => Self::Positional(names.iter().map(|n| f(n)).collect()),
            Self::Keyed(pairs) => {
                Self::Keyed(pairs.iter().map(|(k, d)| (k.clone(), f(d))).collect())
            }
        }
    }
}

impl From<&str> for NodeOutputs {
    fn from(name: &str) -> Self {
        Self::Positional(vec![name.to_string()])
    }
}

impl From<String> for NodeOutputs {
    fn from(name: String) -> Self {
        Self::Positional(vec![name])
    }
}

impl<const N: usize> From<[&str; N]> for NodeOutputs {
    fn from(names: [&str; N]) -> Self {
        Self::Positional(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for NodeOutputs {
    fn from(names: Vec<String>) -> Self {
        Self::Positional(names)
    }
}

/// A unit of computation with declared inputs and outputs
#[derive(Clone)]
pub struct Node {
    func: NodeFn,
    inputs: NodeInputs,
    outputs: NodeOutputs,
    name: Option<String>,
    tags: BTreeSet<String>,
}

impl Node {
    /// Create a node, checking that the declarations fit the function
    pub fn new(
        func: NodeFn,
        inputs: impl Into<NodeInputs>,
        outputs: impl Into<NodeOutputs>,
    ) -> FlowResult<Self> {
        let node = Self {
            func,
            inputs: inputs.into(),
            outputs: outputs.into(),
            name: None,
            tags: BTreeSet::new(),
        };
        node.validate()?;
        Ok(node)
    }

    /// Set the node name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Return a copy of this node with additional tags
    pub fn tagged<I, S>(&self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut node = self.clone();
        node.tags.extend(tags.into_iter().map(Into::into));
        node
    }

    /// Node name, derived from the declarations if none was given
    ///
    /// Derived names are `[in, ...] -> [out, ...]`. Two unnamed nodes with the
    /// same declarations, such as two sinks reading one dataset, get the same
    /// name and cannot share a pipeline until one is given a name.
    pub fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!(
                "[{}] -> [{}]",
                self.inputs.datasets().join(", "),
                self.outputs.datasets().join(", ")
            ),
        }
    }

    /// The name given with [`Node::named`], if any
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Input dataset names in declaration order
    pub fn inputs(&self) -> Vec<&str> {
        self.inputs.datasets()
    }

    /// Output dataset names in declaration order
    pub fn outputs(&self) -> Vec<&str> {
        self.outputs.datasets()
    }

    /// Tags attached to the node
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether the node carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Run the function on values pulled from `provider`
    ///
    /// Returns `(output dataset, value)` pairs in declaration order.
    pub fn invoke(&self, provider: &dyn ValueProvider) -> FlowResult<Vec<(String, Value)>> {
        let args = match &self.inputs {
            NodeInputs::Positional(names) => Args::Positional(
                names
                    .iter()
                    .map(|n| provider.value(n))
                    .collect::<FlowResult<Vec<_>>>()?,
            ),
            NodeInputs::Named(pairs) => {
                let mut map = Map::new();
                for (param, dataset) in pairs {
                    map.insert(param.clone(), provider.value(dataset)?);
                }
                Args::Keyed(map)
            }
        };

        let returned = self.func.call(args).map_err(|source| FlowError::NodeFailed {
            node: self.name(),
            source,
        })?;

        self.distribute(returned)
    }

    /// Copy of the node with datasets and name passed through `rename`
    pub(crate) fn renamed(&self, datasets: &dyn Fn(&str) -> String, name: Option<String>) -> Self {
        let mut node = self.clone();
        node.inputs = self.inputs.rename(datasets);
        node.outputs = self.outputs.rename(datasets);
        if name.is_some() {
            node.name = name;
        }
        node
    }

    fn distribute(&self, value: Value) -> FlowResult<Vec<(String, Value)>> {
        match &self.outputs {
            NodeOutputs::Positional(names) => match names.as_slice() {
                [] if value.is_null() => Ok(Vec::new()),
                [] => Err(self.arity("returned a value but declares no outputs")),
                [single] => Ok(vec![(single.clone(), value)]),
                _ => match value {
                    Value::Array(items) if items.len() == names.len() => {
                        Ok(names.iter().cloned().zip(items).collect())
                    }
                    Value::Array(items) => Err(self.arity(&format!(
                        "declares {} outputs but returned {} values",
                        names.len(),
                        items.len()
                    ))),
                    _ => Err(self.arity(&format!(
                        "declares {} outputs but did not return an array",
                        names.len()
                    ))),
                },
            },
            NodeOutputs::Keyed(pairs) => {
                let Value::Object(mut map) = value else {
                    return Err(self.arity("declares keyed outputs but did not return an object"));
                };

                let mut out = Vec::with_capacity(pairs.len());
                for (key, dataset) in pairs {
                    let value = map.remove(key).ok_or_else(|| {
                        self.arity(&format!("returned no value for key '{}'", key))
                    })?;
                    out.push((dataset.clone(), value));
                }

                if !map.is_empty() {
                    let extra: Vec<&str> = map.keys().map(String::as_str).collect();
                    return Err(self.arity(&format!(
                        "returned undeclared key(s): {}",
                        extra.join(", ")
                    )));
                }
                Ok(out)
            }
        }
    }

    fn validate(&self) -> FlowResult<()> {
        if self.inputs.datasets().iter().any(|d| d.is_empty())
            || self.outputs.datasets().iter().any(|d| d.is_empty())
        {
            return Err(self.invalid("dataset names must not be empty"));
        }

        let mut seen = HashSet::new();
        for output in self.outputs.datasets() {
            if !seen.insert(output) {
                return Err(self.invalid(&format!("output '{}' is declared twice", output)));
            }
        }
        if let NodeOutputs::Keyed(pairs) = &self.outputs {
            let mut keys = HashSet::new();
            for (key, _) in pairs {
                if !keys.insert(key.as_str()) {
                    return Err(self.invalid(&format!("output key '{}' is declared twice", key)));
                }
            }
        }

        match (&self.func.kind, &self.inputs) {
            (FnKind::Positional { arity, .. }, NodeInputs::Positional(names)) => {
                if *arity != names.len() {
                    return Err(self.arity(&format!(
                        "function takes {} argument(s) but {} input(s) are declared",
                        arity,
                        names.len()
                    )));
                }
            }
            (FnKind::Keyed { params, .. }, NodeInputs::Named(pairs)) => {
                let mut declared = BTreeSet::new();
                for (param, _) in pairs {
                    if !declared.insert(param.as_str()) {
                        return Err(self.invalid(&format!("parameter '{}' is bound twice", param)));
                    }
                }
                let expected: BTreeSet<&str> = params.iter().map(String::as_str).collect();
                if declared != expected {
                    return Err(self.arity(&format!(
                        "function takes parameters {:?} but inputs bind {:?}",
                        expected, declared
                    )));
                }
            }
            (FnKind::Positional { .. }, NodeInputs::Named(_)) => {
                return Err(self.arity("positional function cannot take named inputs"));
            }
            (FnKind::Keyed { .. }, NodeInputs::Positional(_)) => {
                return Err(self.arity("keyed function requires named inputs"));
            }
        }

        Ok(())
    }

    fn arity(&self, reason: &str) -> FlowError {
        FlowError::Arity {
            node: self.name(),
            reason: reason.to_string(),
        }
    }

    fn invalid(&self, reason: &str) -> FlowError {
        FlowError::InvalidNode {
            node: self.name(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name())
            .field("func", &self.func)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("tags", &self.tags)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
