//! Declaration model to header/source text (spec §4.6).
//!
//! Two independent passes over the same [`Model`], each assembling its
//! output into a capacity-bounded [`OutputBuffer`] in the exact order
//! spec.md §4.6 lists. Neither pass computes real struct layout — the
//! generated C source computes its own `offsetof`-style offsets when it is
//! later compiled, so the generator only ever emits text.

use reflectc_arena::Arena;
use reflectc_fmt::{FormatArg, OutputBuffer};
use reflectc_model::{EnumRecord, FunctionRecord, Model, StructRecord, UnionRecord, Variable};

const PRIMITIVE_TYPES: [&str; 6] = ["char", "short", "int", "long", "float", "double"];

/// Bytes reserved per declaration on top of a fixed base, when sizing the
/// output buffers. Generous rather than tight — exhausting it is a tier-3
/// fatal error, not something callers should tune per input.
const BYTES_PER_DECLARATION: usize = 512;
const BASE_CAPACITY: usize = 4096;

pub struct GeneratedOutput {
    pub header: Vec<u8>,
    pub source: Vec<u8>,
}

/// Runs both generator passes over `model` and returns the two emitted
/// byte buffers (spec §2: "two output buffers -> emitted as byte slices").
///
/// `arena` backs the scoped scratch used while collecting the distinct
/// `MetaType` name list during header generation (spec §5); the scratch
/// region is released before the header's next step begins.
pub fn generate(model: &Model<'_>, arena: &Arena) -> GeneratedOutput {
    tracing::debug!(
        structs = model.structs.len(),
        enums = model.enums.len(),
        unions = model.unions.len(),
        functions = model.functions.len(),
        "generating header and source"
    );
    GeneratedOutput {
        header: generate_header(model, arena),
        source: generate_source(model),
    }
}

fn capacity_for(model: &Model<'_>) -> usize {
    let decls = model.structs.len() + model.enums.len() + model.unions.len() + model.functions.len();
    BASE_CAPACITY + decls * BYTES_PER_DECLARATION
}

fn declarator(v: &Variable<'_>) -> String {
    let mut s = String::new();
    s.push_str(v.type_name);
    s.push(' ');
    if v.is_pointer {
        s.push('*');
    }
    s.push_str(v.name);
    if v.array_count > 1 {
        s.push('[');
        s.push_str(&v.array_count.to_string());
        s.push(']');
    }
    s
}

fn param_list(params: &[Variable<'_>]) -> String {
    if params.is_empty() {
        "void".to_string()
    } else {
        params.iter().map(declarator).collect::<Vec<_>>().join(", ")
    }
}

fn enum_forward_decl(e: &EnumRecord<'_>) -> String {
    let mut s = String::new();
    s.push_str("enum ");
    if e.is_enum_class {
        s.push_str("struct ");
    }
    s.push_str(e.name);
    if let Some(underlying) = e.underlying {
        s.push_str(" : ");
        s.push_str(underlying);
    }
    s.push(';');
    s
}

fn function_forward_decl(f: &FunctionRecord<'_>) -> String {
    let mut s = String::new();
    if let Some(linkage) = f.linkage {
        s.push_str(linkage);
        s.push(' ');
    }
    s.push_str(f.return_type);
    s.push(' ');
    s.push_str(f.name);
    s.push('(');
    s.push_str(&param_list(&f.params));
    s.push_str(");");
    s
}

fn generate_header<'a>(model: &Model<'a>, arena: &Arena) -> Vec<u8> {
    let mut buf = OutputBuffer::new(capacity_for(model));

    // 1. Include guard open.
    buf.write_str("#ifndef REFLECTC_GENERATED_H\n#define REFLECTC_GENERATED_H\n\n#include <stddef.h>\n\n");

    // 2. MetaType enum, primitives first. The distinct-name list this
    // enum is built from lives in scoped scratch for exactly this step
    // (spec §5) and is released the moment the enum text is written.
    {
        let scratch = arena.scope_begin(256);
        let mut names: bumpalo::collections::Vec<'_, &'a str> = scratch.vec();
        for primitive in PRIMITIVE_TYPES {
            names.push(primitive);
        }
        for name in model.distinct_type_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        buf.write_str("enum MetaType {\n");
        for (i, name) in names.iter().enumerate() {
            buf.write_str("    meta_type_");
            buf.write("%S", &[FormatArg::Slice(name)]);
            buf.write_str(if i + 1 == names.len() { "\n" } else { ",\n" });
        }
        buf.write_str("};\n\n");
        scratch.end();
    }

    // 3. MemberDefinition record + get_num_of_members macro.
    buf.write_str(
        "typedef struct MemberDefinition {\n    enum MetaType type;\n    const char *name;\n    \
         size_t offset;\n    int is_ptr;\n    int arr_size;\n} MemberDefinition;\n\n\
         #define get_num_of_members(type) (num_members_for_##type)\n\n",
    );

    // 4. Per-struct extern table decl + member-count constant.
    for s in &model.structs {
        buf.write(
            "extern MemberDefinition members_of_%S[%d];\n#define num_members_for_%S %d\n",
            &[
                FormatArg::Slice(s.name),
                FormatArg::Int(s.members.len() as i32),
                FormatArg::Slice(s.name),
                FormatArg::Int(s.members.len() as i32),
            ],
        );
    }
    if !model.structs.is_empty() {
        buf.write_str("\n");
    }

    // 5. Forward declarations: structs, then enums, then unions.
    for s in &model.structs {
        buf.write("struct %S;\n", &[FormatArg::Slice(s.name)]);
    }
    for e in &model.enums {
        buf.write_str(&enum_forward_decl(e));
        buf.write_str("\n");
    }
    for u in &model.unions {
        buf.write("union %S;\n", &[FormatArg::Slice(u.name)]);
    }
    buf.write_str("\n");

    // 6. Forward declarations for every function.
    for f in &model.functions {
        buf.write_str(&function_forward_decl(f));
        buf.write_str("\n");
    }
    buf.write_str("\n");

    // 7. Variable/FunctionMetaData record definitions + get_func_meta_data macro.
    buf.write_str(&format!(
        "typedef struct Variable {{\n    const char *type;\n    const char *name;\n}} Variable;\n\n\
         typedef struct FunctionMetaData {{\n    const char *linkage;\n    const char *return_type;\n    \
         const char *name;\n    int param_count;\n    Variable params[{}];\n}} FunctionMetaData;\n\n\
         #define get_func_meta_data(func) (function_data_##func)\n\n",
        reflectc_model::MAX_PARAMS
    ));

    // 8. Extern decl per function's metadata record.
    for f in &model.functions {
        buf.write(
            "extern FunctionMetaData function_data_%S;\n",
            &[FormatArg::Slice(f.name)],
        );
    }
    if !model.functions.is_empty() {
        buf.write_str("\n");
    }

    // 9. Serializer prototype + invocation macros. The top-level macro
    // fixes both indent and bytes-written to 0 for top-level callers
    // (spec §4.6 step 9); `serialize_struct_` leaves both to the caller
    // for its recursive use from inside the generated switch.
    buf.write_str(
        "void serialize_struct__(enum MetaType type, const void *data, char *out, int *written, int indent);\n\n\
         #define serialize_struct(type, data, out, written) (*(written) = 0, serialize_struct__(type, data, out, written, 0))\n\
         #define serialize_struct_(type, data, out, written, indent) serialize_struct__(type, data, out, written, indent)\n\n",
    );

    // 10. Include guard close.
    buf.write_str("#endif /* REFLECTC_GENERATED_H */\n");

    buf.into_bytes()
}

/// Every type mentioned as a member type is assumed to have a
/// corresponding struct arm in the serializer's default switch below
/// (spec §9's documented assumption); this function does not verify it.
fn generate_source(model: &Model<'_>) -> Vec<u8> {
    let mut buf = OutputBuffer::new(capacity_for(model));

    // 1. Include guard open + includes.
    buf.write_str(
        "#include \"reflection.h\"\n\n#include <stdio.h>\n#include <string.h>\n#include <assert.h>\n\n",
    );

    // 2. Recreated struct bodies.
    for s in &model.structs {
        buf.write("struct %S {\n", &[FormatArg::Slice(s.name)]);
        for m in &s.members {
            buf.write_str("    ");
            buf.write_str(&declarator(m));
            buf.write_str(";\n");
        }
        buf.write_str("};\n\n");
    }

    // 3. Populated MemberDefinition[] table per struct.
    for s in &model.structs {
        buf.write(
            "MemberDefinition members_of_%S[%d] = {\n",
            &[FormatArg::Slice(s.name), FormatArg::Int(s.members.len() as i32)],
        );
        for m in &s.members {
            buf.write_str("    { meta_type_");
            buf.write("%S, \"%S\", (size_t)&((", &[FormatArg::Slice(m.type_name), FormatArg::Slice(m.name)]);
            buf.write(
                "%S*)0)->%S, %d, %d },\n",
                &[
                    FormatArg::Slice(s.name),
                    FormatArg::Slice(m.name),
                    FormatArg::Int(m.is_pointer as i32),
                    FormatArg::Int(m.array_count as i32),
                ],
            );
        }
        buf.write_str("};\n\n");
    }

    // 4. Populated FunctionMetaData record per function.
    for f in &model.functions {
        buf.write_str("FunctionMetaData function_data_");
        buf.write("%S = { ", &[FormatArg::Slice(f.name)]);
        match f.linkage {
            Some(l) => buf.write("\"%S\", ", &[FormatArg::Slice(l)]),
            None => buf.write_str("0, "),
        }
        buf.write(
            "\"%S\", \"%S\", %d, { ",
            &[
                FormatArg::Slice(f.return_type),
                FormatArg::Slice(f.name),
                FormatArg::Int(f.params.len() as i32),
            ],
        );
        for (i, p) in f.params.iter().enumerate() {
            buf.write(
                "{\"%S\",\"%S\"}",
                &[FormatArg::Slice(p.type_name), FormatArg::Slice(p.name)],
            );
            if i + 1 != f.params.len() {
                buf.write_str(", ");
            }
        }
        buf.write_str(" } };\n");
    }
    if !model.functions.is_empty() {
        buf.write_str("\n");
    }

    // 5. serialize_struct__ body.
    buf.write_str(
        "void serialize_struct__(enum MetaType type, const void *data, char *out, int *written, int indent) {\n\
         \x20   switch (type) {\n",
    );
    buf.write_str(
        "        case meta_type_char:\n            *written += sprintf(out + *written, \"%*s%d\\n\", indent * 2, \"\", (int)*(const char *)data);\n            break;\n",
    );
    buf.write_str(
        "        case meta_type_short:\n        case meta_type_int:\n        case meta_type_long:\n            \
         *written += sprintf(out + *written, \"%*s%d\\n\", indent * 2, \"\", *(const int *)data);\n            break;\n",
    );
    buf.write_str(
        "        case meta_type_float:\n        case meta_type_double:\n            \
         *written += sprintf(out + *written, \"%*s%f\\n\", indent * 2, \"\", *(const double *)data);\n            break;\n",
    );
    buf.write_str("        default:\n            switch (type) {\n");
    for s in &model.structs {
        buf.write("                case meta_type_%S: {\n", &[FormatArg::Slice(s.name)]);
        buf.write(
            "                    for (int i = 0; i < num_members_for_%S; i++) {\n",
            &[FormatArg::Slice(s.name)],
        );
        buf.write(
            "                        const MemberDefinition *member = &members_of_%S[i];\n",
            &[FormatArg::Slice(s.name)],
        );
        buf.write_str(
            "                        serialize_struct_(member->type, (const char *)data + member->offset, out, written, indent + 1);\n                    }\n                } break;\n",
        );
    }
    buf.write_str("                default:\n                    break;\n            }\n            break;\n");
    buf.write_str("    }\n}\n");

    buf.into_bytes()
}
