use std::collections::BTreeMap;

use crate::model::{ModuleNumber, Question};

/// Immutable, pre-loaded question content.
///
/// Holds each module's ordered questions plus the flattened sequence of all
/// questions (module order, then question order) used by the random mix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    by_module: BTreeMap<ModuleNumber, Vec<Question>>,
    all: Vec<Question>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(by_module: BTreeMap<ModuleNumber, Vec<Question>>) -> Self {
        let all = by_module.values().flatten().cloned().collect();
        Self { by_module, all }
    }

    /// Questions of one module, or `None` if the bank has no such module.
    #[must_use]
    pub fn module(&self, number: ModuleNumber) -> Option<&[Question]> {
        self.by_module.get(&number).map(Vec::as_slice)
    }

    #[must_use]
    pub fn module_len(&self, number: ModuleNumber) -> usize {
        self.module(number).map_or(0, <[Question]>::len)
    }

    pub fn module_numbers(&self) -> impl Iterator<Item = ModuleNumber> + '_ {
        self.by_module.keys().copied()
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleNumber, &[Question])> + '_ {
        self.by_module
            .iter()
            .map(|(number, questions)| (*number, questions.as_slice()))
    }

    #[must_use]
    pub fn all_questions(&self) -> &[Question] {
        &self.all
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}
