//! `process()` — the single core entry point (spec §6), wiring the
//! tokenizer/parser and the generator together over a caller-supplied
//! [`Arena`].
//!
//! `process` takes already-read file contents (file I/O is explicitly out
//! of scope for the core, spec §1) and hands back the two generated byte
//! buffers. Tier-2 diagnosable errors (too many input files, a declaration
//! table or parameter list at its cap) are collected into an
//! [`ErrorRegistry`] and returned alongside the output rather than aborting
//! the whole run, matching spec §7's "execution continues where possible."

use reflectc_arena::Arena;
use reflectc_model::{ErrorRegistry, Model, MAX_INPUT_FILES};
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum DriverError {
    #[snafu(display("too many input files: got {count}, max {max}"))]
    TooManyInputFiles { count: usize, max: usize },
}

/// The two generated outputs plus whatever tier-2 errors were recorded
/// while building the model (spec §7: "the driver drains this registry at
/// shutdown").
pub struct ProcessOutput {
    pub header: Vec<u8>,
    pub source: Vec<u8>,
    pub registry: ErrorRegistry,
}

/// Runs the full tokenize -> parse -> generate pipeline over `input_files`,
/// processed in order (spec §5: "file N+1 begins only after file N's
/// tokens have been fully consumed"). Every slice in `input_files` must
/// already be arena-backed text (see [`Arena::push_file_str`]) so the
/// resulting model's borrows are valid for as long as `arena` is.
pub fn process<'a>(
    input_files: &[&'a str],
    arena: &'a Arena,
) -> Result<ProcessOutput, DriverError> {
    if input_files.len() > MAX_INPUT_FILES {
        return Err(DriverError::TooManyInputFiles {
            count: input_files.len(),
            max: MAX_INPUT_FILES,
        });
    }

    let mut model = Model::new();
    let mut registry = ErrorRegistry::new();

    for (i, file) in input_files.iter().enumerate() {
        tracing::debug!(file_index = i, "processing input file");
        reflectc_parse::parse_into(file, &mut model, &mut registry);
    }

    let generated = reflectc_generate::generate(&model, arena);

    Ok(ProcessOutput {
        header: generated.header,
        source: generated.source,
        registry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_list_produces_valid_skeleton_output() {
        let arena = Arena::with_default_capacities();
        let out = process(&[], &arena).unwrap();
        assert!(out.registry.is_empty());
        let header = String::from_utf8(out.header).unwrap();
        assert!(header.contains("#ifndef REFLECTC_GENERATED_H"));
        assert!(header.contains("meta_type_char"));
    }

    #[test]
    fn too_many_input_files_is_a_driver_error() {
        let arena = Arena::with_default_capacities();
        let text = arena.push_file_str("struct V2 { int x; };");
        let files: Vec<&str> = (0..17).map(|_| text).collect();
        let err = process(&files, &arena).unwrap_err();
        assert!(matches!(err, DriverError::TooManyInputFiles { count: 17, max: 16 }));
    }

    #[test]
    fn multiple_files_accumulate_in_order() {
        let arena = Arena::with_default_capacities();
        let a = arena.push_file_str("struct A { int x; };");
        let b = arena.push_file_str("struct B { int y; };");
        let out = process(&[a, b], &arena).unwrap();
        let header = String::from_utf8(out.header).unwrap();
        let a_pos = header.find("meta_type_A").unwrap();
        let b_pos = header.find("meta_type_B").unwrap();
        assert!(a_pos < b_pos);
    }
}
