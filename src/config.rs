/// Diagnostic switches. Neither changes the generated program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Dump every scope of the symbol table as it is left.
    pub trace_analyze: bool,
    /// Annotate the assembly with `#` comments.
    pub trace_code: bool,
}
