//! The host compiler's argument protocol.

use crate::error::EngineError;

/// A compile flag the engine reads or rewrites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileFlag {
    /// `-o`: the artifact output path.
    Output,
    /// `-trimpath`: path prefix rewrites.
    TrimPath,
    /// `-p`: the package identity.
    Package,
    /// `-buildid`: the slash-delimited build identifier.
    BuildId,
    /// `-importcfg`: the import manifest file.
    ImportCfg,
}

impl CompileFlag {
    const ALL: [CompileFlag; 5] = [
        CompileFlag::Output,
        CompileFlag::TrimPath,
        CompileFlag::Package,
        CompileFlag::BuildId,
        CompileFlag::ImportCfg,
    ];

    /// The flag as written on the command line.
    pub fn name(self) -> &'static str {
        match self {
            CompileFlag::Output => "-o",
            CompileFlag::TrimPath => "-trimpath",
            CompileFlag::Package => "-p",
            CompileFlag::BuildId => "-buildid",
            CompileFlag::ImportCfg => "-importcfg",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Where a flag's value lives in the argument vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlagSlot {
    /// `-f value`: the value is the argument at this index.
    Separate(usize),
    /// `-f=value`: the whole argument at this index.
    Inline(usize),
}

/// A parsed compile command line, `args[0]` being the tool itself.
#[derive(Clone, Debug)]
pub struct CompileArgs {
    args: Vec<String>,
    slots: [FlagSlot; 5],
    sources: Vec<usize>,
}

impl CompileArgs {
    /// Parses a compile command line. Every [`CompileFlag`] is required.
    pub fn parse(args: &[String]) -> Result<Self, EngineError> {
        let mut slots: [Option<FlagSlot>; 5] = [None; 5];
        let mut sources = Vec::new();
        let mut i = 1;
        while i < args.len() {
            let arg = &args[i];
            if let Some((flag, slot)) = match_flag(arg, i) {
                if let FlagSlot::Separate(value) = slot {
                    if value >= args.len() {
                        return Err(EngineError::MissingFlag { flag: flag.name() });
                    }
                    i = value;
                }
                slots[flag.index()] = Some(slot);
            } else if arg.ends_with(".go") {
                sources.push(i);
            }
            i += 1;
        }
        let mut resolved = [FlagSlot::Separate(0); 5];
        for flag in CompileFlag::ALL {
            resolved[flag.index()] =
                slots[flag.index()].ok_or(EngineError::MissingFlag { flag: flag.name() })?;
        }
        Ok(Self {
            args: args.to_vec(),
            slots: resolved,
            sources,
        })
    }

    /// The value of `flag`.
    pub fn get(&self, flag: CompileFlag) -> &str {
        match self.slots[flag.index()] {
            FlagSlot::Separate(i) => &self.args[i],
            FlagSlot::Inline(i) => self.args[i]
                .split_once('=')
                .map_or("", |(_, value)| value),
        }
    }

    /// Replaces the value of `flag`, keeping its written form.
    pub fn set(&mut self, flag: CompileFlag, value: impl Into<String>) {
        let value = value.into();
        match self.slots[flag.index()] {
            FlagSlot::Separate(i) => self.args[i] = value,
            FlagSlot::Inline(i) => self.args[i] = format!("{}={value}", flag.name()),
        }
    }

    /// The `.go` source arguments, in order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|&i| self.args[i].as_str())
    }

    /// Replaces the source argument `old` with `new`. Returns whether it was
    /// present.
    pub fn replace_source(&mut self, old: &str, new: impl Into<String>) -> bool {
        match self.sources.iter().find(|&&i| self.args[i] == old) {
            Some(&i) => {
                self.args[i] = new.into();
                true
            }
            None => false,
        }
    }

    /// Appends an extra source file.
    pub fn push_source(&mut self, path: impl Into<String>) {
        self.sources.push(self.args.len());
        self.args.push(path.into());
    }

    /// The full argument vector.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Consumes the parse, returning the argument vector.
    pub fn into_args(self) -> Vec<String> {
        self.args
    }
}

fn match_flag(arg: &str, index: usize) -> Option<(CompileFlag, FlagSlot)> {
    CompileFlag::ALL.into_iter().find_map(|flag| {
        let rest = arg.strip_prefix(flag.name())?;
        if rest.is_empty() {
            Some((flag, FlagSlot::Separate(index + 1)))
        } else if rest.starts_with('=') {
            Some((flag, FlagSlot::Inline(index)))
        } else {
            None
        }
    })
}

/// Finds the value of a single flag in an arbitrary tool command line.
pub fn find_flag<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == flag {
            return iter.next().map(String::as_str);
        }
        if let Some(value) = arg.strip_prefix(flag).and_then(|r| r.strip_prefix('=')) {
            return Some(value);
        }
    }
    None
}
