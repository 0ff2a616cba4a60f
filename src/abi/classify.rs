use crate::abi::item::AbiItem;
use crate::abi::state_mutability::StateMutability;
use std::fmt;

/// Name of the single token URI accessor that gets special cased in
/// metadata display
pub const METADATA_OPERATION: &str = "tokenURI";

/// How an operation has to be invoked
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Category {
    /// A plain call, nothing is signed
    View,
    /// A transaction that carries no value
    Nonpayable,
    /// A transaction that may carry value
    Payable,
}

impl From<StateMutability> for Category {
    fn from(state: StateMutability) -> Category {
        match state {
            StateMutability::Pure | StateMutability::View => Category::View,
            StateMutability::Nonpayable => Category::Nonpayable,
            StateMutability::Payable => Category::Payable,
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::View => "view",
            Category::Nonpayable => "nonpayable",
            Category::Payable => "payable",
        }
    }

    pub fn is_transaction(&self) -> bool {
        !matches!(self, Category::View)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Functions of an interface grouped by invocation category, each group in
/// the order of the original description
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassifiedInterface {
    pub view: Vec<AbiItem>,
    pub nonpayable: Vec<AbiItem>,
    pub payable: Vec<AbiItem>,
}

impl ClassifiedInterface {
    pub fn get(&self, category: Category) -> &[AbiItem] {
        match category {
            Category::View => &self.view,
            Category::Nonpayable => &self.nonpayable,
            Category::Payable => &self.payable,
        }
    }

    pub fn len(&self) -> usize {
        self.view.len() + self.nonpayable.len() + self.payable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions the functions of an interface description. Events,
/// constructors and the like are left out. Every function lands in exactly
/// one group since mutability can always be derived from the legacy flags.
pub fn classify(items: &[AbiItem]) -> ClassifiedInterface {
    let mut out = ClassifiedInterface::default();
    for item in items {
        match item.category() {
            Some(Category::View) => out.view.push(item.clone()),
            Some(Category::Nonpayable) => out.nonpayable.push(item.clone()),
            Some(Category::Payable) => out.payable.push(item.clone()),
            None => trace!("Not classifying {} {}", item.kind.as_str(), item.name()),
        }
    }
    out
}

pub fn find_metadata_operation(items: &[AbiItem]) -> Option<&AbiItem> {
    items
        .iter()
        .find(|item| item.is_function() && item.name() == METADATA_OPERATION)
}

/// Functions whose lower cased name contains every whitespace separated
/// word of `query`. An empty query matches everything.
pub fn search_operations<'a>(items: &'a [AbiItem], query: &str) -> Vec<&'a AbiItem> {
    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    items
        .iter()
        .filter(|item| item.is_function())
        .filter(|item| {
            let name = item.name().to_lowercase();
            words.iter().all(|w| name.contains(w.as_str()))
        })
        .collect()
}
