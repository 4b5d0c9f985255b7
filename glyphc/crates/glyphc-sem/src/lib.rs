//! glyphc-sem — name resolution, type checking, and type interning (SPEC
//! §4.3).
//!
//! A two-pass analyzer walks the flat AST produced by `glyphc-par`: pass one
//! registers every callable name (the hardcoded functions plus every
//! top-level function signature) so forward references resolve; pass two
//! walks each function body, building nested scopes and annotating every
//! node's `type_id`. The output feeds `glyphc-ir` directly — it never
//! rebuilds a separate typed tree.

pub mod analysis;
pub mod hardcoded;
pub mod scope;
pub mod types;

pub use analysis::{analyze, AnalysisOutput, FunctionInfo, SemaError, SymbolRef};
pub use hardcoded::HardcodedFunction;
pub use scope::{Scope, ScopeId, ScopeTree, SymbolEntry, SymbolKind};
pub use types::{PrimitiveType, StructField, TypeId, TypeInterner, TypeSignature};

#[cfg(test)]
mod tests {
    use super::*;
    use glyphc_par::ast::NodeKind;

    fn analyze_src(src: &str) -> AnalysisOutput {
        let tokens = glyphc_lex::lex(src, glyphc_util::FileId::DUMMY).tokens;
        let mut out = glyphc_par::parse(tokens);
        assert!(out.errors.is_empty(), "parse errors: {:?}", out.errors);
        analyze(&mut out.ast, out.root)
    }

    #[test]
    fn registers_hardcoded_functions_and_resolves_a_call() {
        let out = analyze_src("main :: () -> i32 { print_line(); return 0; }");
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        assert!(out.main_index.is_some());
    }

    #[test]
    fn forward_reference_between_top_level_functions_resolves() {
        let out = analyze_src(
            "main :: () -> i32 { return helper(); } \
             helper :: () -> i32 { return 1; }",
        );
        assert!(out.errors.is_empty(), "{:?}", out.errors);
    }

    #[test]
    fn undefined_identifier_is_reported() {
        let out = analyze_src("main :: () -> i32 { return missing; }");
        assert!(!out.errors.is_empty());
    }

    #[test]
    fn assignment_type_mismatch_is_reported() {
        let out = analyze_src("main :: () -> i32 { x : i32 = 1; x = true; return x; }");
        assert!(out.errors.iter().any(|e| e.message.contains("types do not match")));
    }

    #[test]
    fn break_outside_loop_is_reported() {
        let out = analyze_src("main :: () -> i32 { break; return 0; }");
        assert!(out.errors.iter().any(|e| e.message.contains("break")));
    }

    #[test]
    fn break_inside_while_is_accepted() {
        let out = analyze_src("main :: () -> i32 { while true { break; } return 0; }");
        assert!(out.errors.is_empty(), "{:?}", out.errors);
    }

    #[test]
    fn shadowing_in_nested_block_is_allowed() {
        let out = analyze_src(
            "main :: () -> i32 { x : i32 = 1; if true { x : bool = true; } return x; }",
        );
        assert!(out.errors.is_empty(), "{:?}", out.errors);
    }

    #[test]
    fn redeclaration_in_same_scope_is_reported() {
        let out = analyze_src("main :: () -> i32 { x : i32 = 1; x : i32 = 2; return x; }");
        assert!(out.errors.iter().any(|e| e.message.contains("already declared")));
    }

    #[test]
    fn call_arity_mismatch_is_reported() {
        let out = analyze_src(
            "main :: () -> i32 { return add(1); } \
             add :: (a: i32, b: i32) -> i32 { return a + b; }",
        );
        assert!(out.errors.iter().any(|e| e.message.contains("argument")));
    }

    #[test]
    fn node_types_are_annotated_after_analysis() {
        let tokens = glyphc_lex::lex("main :: () -> i32 { return 1 + 2; }", glyphc_util::FileId::DUMMY).tokens;
        let mut out = glyphc_par::parse(tokens);
        let result = analyze(&mut out.ast, out.root);
        let func = out.ast.get(out.ast.get(out.root).children[0]);
        let body = out.ast.get(func.children[0]);
        let ret = out.ast.get(body.children[0]);
        let NodeKind::Return = ret.kind else { panic!("expected return") };
        let expr = out.ast.get(ret.children[0]);
        assert_eq!(expr.type_id, Some(result.types.i32));
    }
}
