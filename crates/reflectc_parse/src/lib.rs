//! Token stream to declaration model (spec §4.4).
//!
//! One top-level loop per input file; each iteration reads one token and
//! dispatches on it. Parser failures are non-fatal: a malformed
//! declaration is abandoned and scanning resumes at the next token (spec
//! §4.7 tier 1) — nothing is pushed to the error registry for these, only
//! for the tier-2 diagnosable cases (a declaration table or a function's
//! parameter list at its capacity).

use std::collections::VecDeque;

use arrayvec::ArrayVec;
use reflectc_model::{
    EnumRecord, ErrorKind, ErrorRegistry, FunctionRecord, Model, StructRecord, UnionRecord,
    Variable, MAX_PARAMS,
};
use reflectc_tokenize::{Token, TokenKind, Tokenizer};

const LINKAGE_KEYWORDS: [&str; 3] = ["static", "inline", "internal"];
const CONTROL_WORDS: [&str; 4] = ["if", "do", "while", "switch"];
const ENTRY_POINTS: [&str; 5] = [
    "main",
    "WinMain",
    "_mainCRTStartup",
    "_WinMainCRTStartup",
    "__DllMainCRTStartup",
];

/// A small lookahead buffer over [`Tokenizer`]. The grammar needs up to two
/// tokens of lookahead (`(void)` normalization) and occasionally needs to
/// put a token back (array-suffix scanning that overshoots into the next
/// real boundary token).
struct Lexer<'a> {
    tokenizer: Tokenizer<'a>,
    buffer: VecDeque<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            tokenizer: Tokenizer::new(input),
            buffer: VecDeque::new(),
        }
    }

    fn fill(&mut self, n: usize) {
        while self.buffer.len() < n {
            let tok = self.tokenizer.next_token();
            self.buffer.push_back(tok);
        }
    }

    fn next(&mut self) -> Token<'a> {
        self.fill(1);
        self.buffer.pop_front().expect("just filled")
    }

    fn peek_at(&mut self, idx: usize) -> Token<'a> {
        self.fill(idx + 1);
        self.buffer[idx]
    }

    fn peek(&mut self) -> Token<'a> {
        self.peek_at(0)
    }

    fn push_back(&mut self, tok: Token<'a>) {
        self.buffer.push_front(tok);
    }

    /// Raw "skip to end of line" for a `#`-directive found inside a struct
    /// body. Only valid with nothing buffered (the `#` itself must have
    /// just been consumed via `next`, not `peek`).
    fn skip_to_end_of_line(&mut self) {
        debug_assert!(self.buffer.is_empty());
        self.tokenizer.skip_to_end_of_line();
    }
}

/// Parses one input file's worth of tokens, appending every declaration
/// found to `model`. Independent of any other file; the caller runs this
/// once per file, in order (spec §4.5, §5).
pub fn parse_into<'a>(input: &'a str, model: &mut Model<'a>, registry: &mut ErrorRegistry) {
    tracing::debug!(bytes = input.len(), "parsing input file");
    let mut lexer = Lexer::new(input);
    loop {
        let tok = lexer.next();
        match tok.kind {
            TokenKind::EndOfStream => break,
            TokenKind::Identifier if tok.text == "struct" => parse_struct(&mut lexer, model, registry),
            TokenKind::Identifier if tok.text == "union" => parse_union(&mut lexer, model, registry),
            TokenKind::Identifier if tok.text == "enum" => parse_enum(&mut lexer, model, registry),
            TokenKind::Identifier => parse_function_candidate(tok, &mut lexer, model, registry),
            _ => {}
        }
    }
}

fn skip_to_semicolon(lexer: &mut Lexer<'_>) {
    loop {
        let t = lexer.next();
        if matches!(t.kind, TokenKind::SemiColon | TokenKind::EndOfStream) {
            break;
        }
    }
}

/// Reads an optional `[<number>]` array suffix starting right after the
/// `[` has already been consumed. Any token found in place of a numeric
/// size, or in place of the closing `]`, is pushed back so the caller's
/// normal dispatch sees it — this keeps array-suffix scanning from
/// silently swallowing a real parameter/member boundary.
fn read_array_suffix<'a>(lexer: &mut Lexer<'a>, array_count: &mut u32) {
    let first = lexer.next();
    if first.kind != TokenKind::Number {
        if first.kind != TokenKind::CloseBracket {
            lexer.push_back(first);
        }
        return;
    }
    if let Ok(n) = first.text.parse::<u32>() {
        *array_count = n.max(1);
    }
    let close = lexer.next();
    if close.kind != TokenKind::CloseBracket {
        lexer.push_back(close);
    }
}

fn parse_struct<'a>(lexer: &mut Lexer<'a>, model: &mut Model<'a>, registry: &mut ErrorRegistry) {
    let name_tok = lexer.next();
    if name_tok.kind != TokenKind::Identifier {
        return;
    }
    if lexer.next().kind != TokenKind::OpenBrace {
        return;
    }

    let mut members = Vec::new();
    let mut closed = false;
    loop {
        let tok = lexer.next();
        match tok.kind {
            TokenKind::CloseBrace => {
                closed = true;
                break;
            }
            TokenKind::EndOfStream => break,
            TokenKind::Hash => lexer.skip_to_end_of_line(),
            TokenKind::Tilde => {}
            TokenKind::Identifier if tok.text == "inline" || tok.text == "func" => {
                skip_to_semicolon(lexer);
            }
            _ => members.push(parse_member(tok, lexer)),
        }
    }

    if !closed {
        return;
    }
    if let Err(err) = model.push_struct(StructRecord {
        name: name_tok.text,
        members,
    }) {
        registry.push(err);
    }
}

fn parse_member<'a>(type_tok: Token<'a>, lexer: &mut Lexer<'a>) -> Variable<'a> {
    let mut var = Variable::of_type(type_tok.text);
    loop {
        let tok = lexer.next();
        match tok.kind {
            TokenKind::SemiColon | TokenKind::EndOfStream => break,
            TokenKind::Asterisk => var.is_pointer = true,
            TokenKind::OpenBracket => {
                let mut count = var.array_count;
                read_array_suffix(lexer, &mut count);
                var.set_array_count(count);
            }
            TokenKind::Identifier => var.name = tok.text,
            _ => {}
        }
    }
    var
}

fn parse_union<'a>(lexer: &mut Lexer<'a>, model: &mut Model<'a>, registry: &mut ErrorRegistry) {
    let name_tok = lexer.next();
    if name_tok.kind != TokenKind::Identifier {
        return;
    }
    if let Err(err) = model.push_union(UnionRecord { name: name_tok.text }) {
        registry.push(err);
    }
}

fn parse_enum<'a>(lexer: &mut Lexer<'a>, model: &mut Model<'a>, registry: &mut ErrorRegistry) {
    let mut tok = lexer.next();
    let mut is_enum_class = false;
    if tok.kind == TokenKind::Identifier && (tok.text == "class" || tok.text == "struct") {
        is_enum_class = true;
        tok = lexer.next();
    }
    if tok.kind != TokenKind::Identifier {
        return;
    }
    let name = tok.text;

    let mut underlying = None;
    if lexer.peek().kind == TokenKind::Colon {
        lexer.next();
        let ty = lexer.next();
        if ty.kind == TokenKind::Identifier {
            underlying = Some(ty.text);
        }
    }

    if lexer.next().kind != TokenKind::OpenBrace {
        return;
    }

    if let Err(err) = model.push_enum(EnumRecord {
        name,
        underlying,
        is_enum_class,
    }) {
        registry.push(err);
    }
}

#[derive(Default)]
struct ParamAccumulator<'a> {
    type_name: Option<&'a str>,
    name: &'a str,
    is_pointer: bool,
    array_count: u32,
    touched: bool,
}

impl<'a> ParamAccumulator<'a> {
    fn take(&mut self) -> Option<Variable<'a>> {
        if !self.touched {
            return None;
        }
        let var = Variable {
            type_name: self.type_name.unwrap_or(""),
            name: self.name,
            is_pointer: self.is_pointer,
            array_count: self.array_count.max(1),
        };
        *self = ParamAccumulator::default();
        Some(var)
    }
}

fn parse_function_candidate<'a>(
    first_tok: Token<'a>,
    lexer: &mut Lexer<'a>,
    model: &mut Model<'a>,
    registry: &mut ErrorRegistry,
) {
    let mut linkage = None;
    let return_type_tok;
    if LINKAGE_KEYWORDS.contains(&first_tok.text) {
        linkage = Some(first_tok.text);
        let ret = lexer.next();
        if ret.kind != TokenKind::Identifier {
            return;
        }
        return_type_tok = ret;
    } else {
        return_type_tok = first_tok;
    }

    let name_tok = lexer.next();
    if name_tok.kind != TokenKind::Identifier {
        return;
    }
    if CONTROL_WORDS.contains(&name_tok.text) || ENTRY_POINTS.contains(&name_tok.text) {
        return;
    }

    if lexer.next().kind != TokenKind::OpenParen {
        return;
    }

    let mut params: ArrayVec<Variable<'a>, MAX_PARAMS> = ArrayVec::new();
    let mut overflowed = false;

    // `(void)` normalizes to zero parameters.
    if lexer.peek_at(0).kind == TokenKind::Identifier
        && lexer.peek_at(0).text == "void"
        && lexer.peek_at(1).kind == TokenKind::CloseParen
    {
        lexer.next();
        lexer.next();
    } else {
        let mut acc = ParamAccumulator::default();
        loop {
            let tok = lexer.next();
            match tok.kind {
                TokenKind::CloseParen => {
                    if let Some(v) = acc.take() {
                        push_param(&mut params, v, name_tok.text, registry, &mut overflowed);
                    }
                    break;
                }
                TokenKind::OpenBrace | TokenKind::EndOfStream => return,
                TokenKind::Comma => {
                    if let Some(v) = acc.take() {
                        push_param(&mut params, v, name_tok.text, registry, &mut overflowed);
                    }
                }
                TokenKind::Asterisk => {
                    acc.is_pointer = true;
                    acc.touched = true;
                }
                TokenKind::OpenBracket => {
                    read_array_suffix(lexer, &mut acc.array_count);
                    acc.touched = true;
                }
                TokenKind::Identifier => {
                    if acc.type_name.is_none() {
                        acc.type_name = Some(tok.text);
                    } else {
                        acc.name = tok.text;
                    }
                    acc.touched = true;
                }
                _ => {}
            }
        }
    }

    if let Err(err) = model.push_function(FunctionRecord {
        linkage,
        return_type: return_type_tok.text,
        name: name_tok.text,
        params,
    }) {
        registry.push(err);
    }
}

fn push_param<'a>(
    params: &mut ArrayVec<Variable<'a>, MAX_PARAMS>,
    var: Variable<'a>,
    func_name: &str,
    registry: &mut ErrorRegistry,
    overflowed: &mut bool,
) {
    if params.try_push(var).is_err() && !*overflowed {
        *overflowed = true;
        registry.push(ErrorKind::TooManyParameters {
            name: func_name.to_string(),
            max: MAX_PARAMS,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> (Model<'_>, ErrorRegistry) {
        let mut model = Model::new();
        let mut registry = ErrorRegistry::new();
        parse_into(src, &mut model, &mut registry);
        (model, registry)
    }

    #[test]
    fn simple_struct() {
        let (model, _) = parse("struct V2 { int x; int y; };");
        assert_eq!(model.structs.len(), 1);
        let v2 = &model.structs[0];
        assert_eq!(v2.name, "V2");
        assert_eq!(v2.members.len(), 2);
        assert_eq!(v2.members[0].type_name, "int");
        assert_eq!(v2.members[0].name, "x");
        assert!(!v2.members[0].is_pointer);
        assert_eq!(v2.members[0].array_count, 1);
        assert_eq!(v2.members[1].name, "y");
    }

    #[test]
    fn struct_with_pointer_and_array_members() {
        let (model, _) = parse("struct Thing { char *name; int values[5]; };");
        let thing = &model.structs[0];
        assert!(thing.members[0].is_pointer);
        assert_eq!(thing.members[0].name, "name");
        assert_eq!(thing.members[1].array_count, 5);
        assert_eq!(thing.members[1].name, "values");
    }

    #[test]
    fn inline_and_func_members_are_skipped() {
        // The heuristic skips to the next `;`, so only body-less member
        // declarations are tolerated — a literal brace body would desync
        // the struct scan (spec §9's documented fragility).
        let (model, _) = parse("struct Widget { inline int helper(); func int other(); int x; };");
        let widget = &model.structs[0];
        assert_eq!(widget.members.len(), 1);
        assert_eq!(widget.members[0].name, "x");
    }

    #[test]
    fn enum_class_with_underlying_type() {
        let (model, _) = parse("enum class FooBar : short { a, b };");
        assert_eq!(model.enums.len(), 1);
        let e = &model.enums[0];
        assert_eq!(e.name, "FooBar");
        assert_eq!(e.underlying, Some("short"));
        assert!(e.is_enum_class);
        assert!(model.functions.is_empty());
    }

    #[test]
    fn plain_enum_no_underlying() {
        let (model, _) = parse("enum Color { red, green, blue };");
        let e = &model.enums[0];
        assert_eq!(e.name, "Color");
        assert_eq!(e.underlying, None);
        assert!(!e.is_enum_class);
    }

    #[test]
    fn union_has_no_members() {
        let (model, _) = parse("union Raw { int i; float f; };");
        assert_eq!(model.unions.len(), 1);
        assert_eq!(model.unions[0].name, "Raw");
    }

    #[test]
    fn static_function_with_params() {
        let (model, _) = parse("static int add(int a, int b);");
        assert_eq!(model.functions.len(), 1);
        let f = &model.functions[0];
        assert_eq!(f.linkage, Some("static"));
        assert_eq!(f.return_type, "int");
        assert_eq!(f.name, "add");
        assert_eq!(f.param_count(), 2);
        assert_eq!(f.params[0].type_name, "int");
        assert_eq!(f.params[0].name, "a");
        assert_eq!(f.params[1].name, "b");
    }

    #[test]
    fn void_only_params_normalize_to_empty() {
        let (model, _) = parse("void noop(void);");
        let f = &model.functions[0];
        assert_eq!(f.name, "noop");
        assert_eq!(f.param_count(), 0);
    }

    #[test]
    fn entry_points_and_control_words_are_not_functions() {
        let (model, _) = parse("int main(void); int if(void); int WinMain(void);");
        assert!(model.functions.is_empty());
    }

    #[test]
    fn struct_member_nested_in_earlier_struct() {
        let (model, _) = parse(
            "struct V2 { int x; int y; }; struct Ball { V2 pos; int radius; int speed; int direction; };",
        );
        assert_eq!(model.structs.len(), 2);
        assert_eq!(model.structs[1].members[0].type_name, "V2");
    }

    #[test]
    fn if_0_hides_a_struct() {
        let (model, _) = parse("#if 0\nstruct Hidden {};\n#endif\nstruct Shown { int x; };");
        assert_eq!(model.structs.len(), 1);
        assert_eq!(model.structs[0].name, "Shown");
    }

    #[test]
    fn too_many_params_is_a_registry_error_not_a_panic() {
        let params = (0..40)
            .map(|i| format!("int p{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let src = format!("void many({params});");
        let (model, registry) = parse(&src);
        assert_eq!(model.functions[0].param_count(), MAX_PARAMS);
        assert_eq!(registry.len(), 1);
    }
}
