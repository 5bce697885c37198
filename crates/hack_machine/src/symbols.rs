use std::collections::HashMap;

use thiserror_no_std::Error;

use crate::{KBD, SCREEN, VARIABLE_BASE, Word};

/// Names every program can use without declaring them.
pub const PREDEFINED: [(&str, Word); 23] = [
    ("SP", 0),
    ("LCL", 1),
    ("ARG", 2),
    ("THIS", 3),
    ("THAT", 4),
    ("R0", 0),
    ("R1", 1),
    ("R2", 2),
    ("R3", 3),
    ("R4", 4),
    ("R5", 5),
    ("R6", 6),
    ("R7", 7),
    ("R8", 8),
    ("R9", 9),
    ("R10", 10),
    ("R11", 11),
    ("R12", 12),
    ("R13", 13),
    ("R14", 14),
    ("R15", 15),
    ("SCREEN", SCREEN),
    ("KBD", KBD),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol `{0}` is already defined")]
    DuplicateSymbol(String),
    #[error("no RAM left for variable `{0}`")]
    VariableSpaceExhausted(String),
}

/// Name to address map shared by labels, variables and the predefined
/// registers.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, Word>,
    next_variable: Word,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let symbols = PREDEFINED
            .iter()
            .map(|(name, address)| (name.to_string(), *address))
            .collect();
        Self {
            symbols,
            next_variable: VARIABLE_BASE,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn address(&self, name: &str) -> Option<Word> {
        self.symbols.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Bind a label to an instruction address. Redefining any existing name,
    /// predefined ones included, is an error.
    pub fn bind_label(&mut self, name: &str, address: Word) -> Result<(), SymbolError> {
        if self.contains(name) {
            return Err(SymbolError::DuplicateSymbol(name.to_string()));
        }
        self.symbols.insert(name.to_string(), address);
        Ok(())
    }

    /// Look a name up, giving it the next free data address on first use.
    pub fn resolve_variable(&mut self, name: &str) -> Result<Word, SymbolError> {
        if let Some(address) = self.address(name) {
            return Ok(address);
        }
        let address = self.next_variable;
        if address >= SCREEN {
            return Err(SymbolError::VariableSpaceExhausted(name.to_string()));
        }
        self.next_variable = address
            .checked_add(1)
            .ok_or_else(|| SymbolError::VariableSpaceExhausted(name.to_string()))?;
        self.symbols.insert(name.to_string(), address);
        tracing::trace!(name, address, "allocated variable");
        Ok(address)
    }

    /// Address the next new variable would get.
    pub fn next_variable(&self) -> Word {
        self.next_variable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_symbols() {
        let table = SymbolTable::new();
        assert_eq!(table.address("SP"), Some(0));
        assert_eq!(table.address("R0"), Some(0));
        assert_eq!(table.address("THAT"), Some(4));
        assert_eq!(table.address("R15"), Some(15));
        assert_eq!(table.address("SCREEN"), Some(16384));
        assert_eq!(table.address("KBD"), Some(24576));
        assert_eq!(table.address("r0"), None);
        assert_eq!(table.len(), PREDEFINED.len());
    }

    #[test]
    fn test_variables_allocate_in_order() -> Result<(), SymbolError> {
        let mut table = SymbolTable::new();
        assert_eq!(table.resolve_variable("i")?, 16);
        assert_eq!(table.resolve_variable("sum")?, 17);
        assert_eq!(table.resolve_variable("i")?, 16);
        assert_eq!(table.resolve_variable("R3")?, 3);
        assert_eq!(table.next_variable(), 18);
        Ok(())
    }

    #[test]
    fn test_labels_cannot_be_rebound() -> Result<(), SymbolError> {
        let mut table = SymbolTable::new();
        table.bind_label("LOOP", 4)?;
        assert_eq!(table.address("LOOP"), Some(4));
        assert_eq!(
            table.bind_label("LOOP", 9),
            Err(SymbolError::DuplicateSymbol("LOOP".to_string()))
        );
        assert_eq!(
            table.bind_label("SP", 9),
            Err(SymbolError::DuplicateSymbol("SP".to_string()))
        );
        assert_eq!(table.address("LOOP"), Some(4));
        Ok(())
    }

    #[test]
    fn test_variable_space_ends_at_screen() -> Result<(), SymbolError> {
        let mut table = SymbolTable::new();
        let available = usize::from(SCREEN - VARIABLE_BASE);
        for index in 0..available {
            table.resolve_variable(&format!("v{index}"))?;
        }
        assert_eq!(
            table.resolve_variable("overflow"),
            Err(SymbolError::VariableSpaceExhausted("overflow".to_string()))
        );
        Ok(())
    }
}
