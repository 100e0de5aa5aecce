use rox::ast::{Expr, LiteralValue, Stmt};
use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::token::Token;

fn tokens(source: &str) -> Vec<Token> {
    Scanner::new(source)
        .collect::<Result<Vec<_>, _>>()
        .expect("source should scan cleanly")
}

fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let tokens = tokens(source);
    let result = Parser::new(&tokens).parse();
    result
}

fn printed(source: &str) -> Vec<String> {
    parse(source)
        .expect("source should parse")
        .iter()
        .map(AstPrinter::print_stmt)
        .collect()
}

fn errors(source: &str) -> Vec<String> {
    parse(source)
        .expect_err("source should fail to parse")
        .iter()
        .map(|e| e.to_string())
        .collect()
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(
        printed("1 + 2 * 3 - 4 / -5;"),
        vec!["(; (- (+ 1.0 (* 2.0 3.0)) (/ 4.0 (- 5.0))))"]
    );
    assert_eq!(
        printed("a = b = c or d and !e == f < g;"),
        vec!["(; (= a (= b (or c (and d (== (! e) (< f g)))))))"]
    );
}

#[test]
fn calls_and_properties() {
    assert_eq!(
        printed("a.b(1, \"two\").c = nil;"),
        vec!["(; (= (. (call (. a b) 1.0 two) c) nil))"]
    );
}

#[test]
fn for_loop_is_lowered_to_while() {
    assert_eq!(
        printed("for (var i = 0; i < 3; i = i + 1) print i;"),
        vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
    );

    // No clauses at all: condition defaults to `true`, no wrapping block.
    assert_eq!(printed("for (;;) print 1;"), vec!["(while true (print 1.0))"]);
}

#[test]
fn for_loop_without_initializer_has_no_block() {
    let statements = parse("for (; x; ) {}").unwrap();

    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Stmt::While { .. }));
}

#[test]
fn class_with_superclass_and_methods() {
    assert_eq!(
        printed("class B < A { init(x) { this.x = x; } get() { return super.get(); } }"),
        vec![
            "(class B < A (method init(x) (body (; (= (. this x) x)))) \
             (method get() (body (return (call (super get))))))"
        ]
    );
}

#[test]
fn declarations_and_control_flow() {
    assert_eq!(
        printed("var a; var b = 2; fun f(x, y) { if (x) return y; else return; } while (a) { f(1, 2); }"),
        vec![
            "(var a)",
            "(var b 2.0)",
            "(fun f(x y) (body (if x (return y) (return))))",
            "(while a (block (; (call f 1.0 2.0))))",
        ]
    );
}

#[test]
fn expression_ids_are_unique_and_continue_from_start() {
    let tokens = tokens("a = b; c;");
    let mut parser = Parser::starting_at(&tokens, 100);
    let statements = parser.parse().unwrap();

    let mut ids = Vec::new();
    for stmt in &statements {
        if let Stmt::Expression(expr) = stmt {
            collect_ids(expr, &mut ids);
        }
    }

    // `a` is first parsed as a variable (100) and then rewritten into the
    // assignment (102), so 100 never reaches the tree.
    ids.sort_unstable();
    assert_eq!(ids, vec![101, 102, 103]);
    assert_eq!(parser.next_id(), 104);
}

fn collect_ids(expr: &Expr, ids: &mut Vec<usize>) {
    match expr {
        Expr::Variable { id, .. } | Expr::This { id, .. } | Expr::Super { id, .. } => ids.push(id.0),
        Expr::Assign { id, value, .. } => {
            ids.push(id.0);
            collect_ids(value, ids);
        }
        _ => {}
    }
}

#[test]
fn literals() {
    let statements = parse("true; false; nil; 1.5; \"s\";").unwrap();
    let literals: Vec<&LiteralValue> = statements
        .iter()
        .map(|stmt| match stmt {
            Stmt::Expression(Expr::Literal(lit)) => lit,
            other => panic!("unexpected {:?}", other),
        })
        .collect();

    assert_eq!(
        literals,
        vec![
            &LiteralValue::True,
            &LiteralValue::False,
            &LiteralValue::Nil,
            &LiteralValue::Number(1.5),
            &LiteralValue::Str("s".to_string()),
        ]
    );
}

#[test]
fn reports_two_independent_syntax_errors() {
    assert_eq!(
        errors("var = 1;\nprint 2;\nprint (3;\nprint 4;"),
        vec![
            "[line 1] Error at '=': Expected variable name",
            "[line 3] Error at ';': Expected ')' after expression",
        ]
    );
}

#[test]
fn error_at_end_of_input() {
    assert_eq!(errors("print 1"), vec!["[line 1] Error at end: Expected ';' after value"]);
}

#[test]
fn invalid_assignment_target_does_not_stop_parsing() {
    assert_eq!(
        errors("1 + 2 = 3;\nvar ok = ;"),
        vec![
            "[line 1] Error at '=': Invalid assignment target",
            "[line 2] Error at ';': Expected expression",
        ]
    );
}

#[test]
fn too_many_arguments_and_parameters() {
    let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let call = format!("f({});", args.join(", "));
    assert_eq!(
        errors(&call),
        vec!["[line 1] Error at '255': Can't have more than 255 arguments"]
    );

    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let decl = format!("fun f({}) {{}}", params.join(", "));
    assert_eq!(
        errors(&decl),
        vec!["[line 1] Error at 'p255': Can't have more than 255 parameters"]
    );
}

#[test]
fn exactly_255_arguments_is_fine() {
    let args: Vec<String> = (0..255).map(|i| i.to_string()).collect();
    assert!(parse(&format!("f({});", args.join(", "))).is_ok());
}

#[test]
fn super_requires_method_name() {
    assert_eq!(
        errors("super;"),
        vec!["[line 1] Error at ';': Expected '.' after 'super'"]
    );
}
