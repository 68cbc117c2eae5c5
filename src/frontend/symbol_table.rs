//! Symbol table shared by the IR generator and the assembly translator.
//!
//! There are exactly two scopes: the program-wide GLOBAL scope and the LOCAL
//! scope of the function currently being compiled. The LOCAL scope is flat
//! (nested blocks do not open new scopes) and is emptied between functions.

pub const WORD_SIZE: i32 = 4;

/// Offset of the first parameter. `0($fp)` holds the saved return address
/// and `4($fp)` the caller's frame pointer.
pub const PARAM_BASE_OFFSET: i32 = 8;

/// Offset of the first non-parameter local or temporary.
pub const LOCAL_BASE_OFFSET: i32 = -WORD_SIZE;

/// Name of the runtime routine every program may call.
pub const PRINTLN: &str = "println";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Local,
}

/// Handle to an entry of a [`SymbolTable`].
///
/// Handles into the LOCAL scope are only meaningful for the function they
/// were created in, see [`SymbolTable::take_local`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId {
    scope: Scope,
    index: usize,
}

impl SymbolId {
    /// Rebuilds a handle from its position, e.g. for an entry of a LOCAL
    /// snapshot. Only the table itself hands out handles otherwise.
    pub(crate) fn new(scope: Scope, index: usize) -> Self {
        SymbolId { scope, index }
    }

    pub fn scope(self) -> Scope {
        self.scope
    }

    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Function {
        num_params: usize,
    },
    Variable {
        is_param: bool,
        // Unknown until the function's IR has been generated
        frame_offset: Option<i32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub scope: Scope,
}

impl SymbolEntry {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { .. })
    }

    pub fn is_param(&self) -> bool {
        matches!(self.kind, SymbolKind::Variable { is_param: true, .. })
    }

    pub fn num_params(&self) -> Option<usize> {
        match self.kind {
            SymbolKind::Function { num_params } => Some(num_params),
            SymbolKind::Variable { .. } => None,
        }
    }

    pub fn frame_offset(&self) -> Option<i32> {
        match self.kind {
            SymbolKind::Variable { frame_offset, .. } => frame_offset,
            SymbolKind::Function { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    global: Vec<SymbolEntry>,
    local: Vec<SymbolEntry>,
}

impl SymbolTable {
    /// Creates an empty table with no scopes populated
    pub fn new() -> Self {
        SymbolTable {
            global: Vec::new(),
            local: Vec::new(),
        }
    }

    /// Creates a table whose GLOBAL scope already knows the runtime routines
    pub fn with_builtins() -> Self {
        let mut table = SymbolTable::new();
        table.declare_function(PRINTLN, 1);
        table
    }

    pub fn declare_function(&mut self, name: &str, num_params: usize) -> SymbolId {
        self.insert(SymbolEntry {
            name: name.to_string(),
            kind: SymbolKind::Function { num_params },
            scope: Scope::Global,
        })
    }

    pub fn declare_variable(&mut self, scope: Scope, name: &str, is_param: bool) -> SymbolId {
        self.insert(SymbolEntry {
            name: name.to_string(),
            kind: SymbolKind::Variable {
                is_param,
                frame_offset: None,
            },
            scope,
        })
    }

    fn insert(&mut self, entry: SymbolEntry) -> SymbolId {
        let scope = entry.scope;
        let entries = match scope {
            Scope::Global => &mut self.global,
            Scope::Local => &mut self.local,
        };
        entries.push(entry);
        SymbolId {
            scope,
            index: entries.len() - 1,
        }
    }

    /// Finds the most deeply nested declaration of `name`.
    /// Within a scope the newest declaration wins.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        Self::scope_lookup(&self.local, Scope::Local, name)
            .or_else(|| Self::scope_lookup(&self.global, Scope::Global, name))
    }

    fn scope_lookup(entries: &[SymbolEntry], scope: Scope, name: &str) -> Option<SymbolId> {
        entries
            .iter()
            .rposition(|entry| entry.name == name)
            .map(|index| SymbolId { scope, index })
    }

    pub fn get(&self, id: SymbolId) -> Option<&SymbolEntry> {
        self.symbols().get(id)
    }

    /// Gives every LOCAL variable its slot in the stack frame.
    ///
    /// Parameters get increasing offsets from [`PARAM_BASE_OFFSET`] in
    /// declaration order, so the first parameter sits nearest the frame
    /// pointer. Every other local and temporary gets a decreasing offset from
    /// [`LOCAL_BASE_OFFSET`]. Must run after IR generation for the function
    /// has finished allocating temporaries.
    pub fn assign_frame_offsets(&mut self) {
        let mut param_offset = PARAM_BASE_OFFSET;
        let mut local_offset = LOCAL_BASE_OFFSET;
        for entry in &mut self.local {
            if let SymbolKind::Variable {
                is_param,
                frame_offset,
            } = &mut entry.kind
            {
                if *is_param {
                    *frame_offset = Some(param_offset);
                    param_offset += WORD_SIZE;
                } else {
                    *frame_offset = Some(local_offset);
                    local_offset -= WORD_SIZE;
                }
            }
        }
    }

    /// Number of non-parameter LOCAL variables, temporaries included.
    pub fn locals_count(&self) -> usize {
        count_locals(&self.local)
    }

    /// Removes the LOCAL scope and hands its entries to the caller.
    pub fn take_local(&mut self) -> Vec<SymbolEntry> {
        std::mem::take(&mut self.local)
    }

    pub fn clear_local(&mut self) {
        self.local.clear();
    }

    pub fn globals(&self) -> &[SymbolEntry] {
        &self.global
    }

    pub fn symbols(&self) -> Symbols<'_> {
        Symbols::new(&self.global, &self.local)
    }
}

fn count_locals(entries: &[SymbolEntry]) -> usize {
    entries
        .iter()
        .filter(|entry| !entry.is_function() && !entry.is_param())
        .count()
}

/// Read-only view over one GLOBAL and one LOCAL scope.
///
/// The LOCAL slice may be the live table or a snapshot taken with
/// [`SymbolTable::take_local`] after the function was lowered.
#[derive(Debug, Clone, Copy)]
pub struct Symbols<'a> {
    global: &'a [SymbolEntry],
    local: &'a [SymbolEntry],
}

impl<'a> Symbols<'a> {
    pub fn new(global: &'a [SymbolEntry], local: &'a [SymbolEntry]) -> Self {
        Symbols { global, local }
    }

    pub fn get(&self, id: SymbolId) -> Option<&'a SymbolEntry> {
        match id.scope {
            Scope::Global => self.global.get(id.index),
            Scope::Local => self.local.get(id.index),
        }
    }

    pub fn locals(&self) -> &'a [SymbolEntry] {
        self.local
    }

    pub fn locals_count(&self) -> usize {
        count_locals(self.local)
    }

    pub fn find_global(&self, name: &str) -> Option<SymbolId> {
        SymbolTable::scope_lookup(self.global, Scope::Global, name)
    }
}
