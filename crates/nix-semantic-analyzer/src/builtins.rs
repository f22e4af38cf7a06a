//! The names variable-lookup analysis resolves without ever finding a
//! binding site: `builtins`, `derivation`, the other globals every Nix
//! evaluation environment predefines. `spec.md` leaves the exact set
//! unspecified ("the full nixpkgs builtins table is out of scope"); this is
//! the subset real-world Nix files reference most, kept small and easy to
//! extend rather than an attempt at a complete nixpkgs mirror.

pub const BUILTIN_NAMES: &[&str] = &[
    "builtins",
    "derivation",
    "abort",
    "throw",
    "import",
    "toString",
    "map",
    "filter",
    "removeAttrs",
    "baseNameOf",
    "dirOf",
    "isNull",
    "fetchTarball",
    "fetchGit",
    "true",
    "false",
    "null",
];
