use rox::host::Capture;
use rox::lox::Lox;

/// Runs `source` and returns the diagnostics as printed.
fn diagnostics(source: &str) -> Vec<String> {
    let mut lox = Lox::new(Capture::default());
    lox.run(source).iter().map(|e| e.to_string()).collect()
}

#[test]
fn reading_local_in_its_own_initializer() {
    assert_eq!(
        diagnostics("var a = 1; { var a = a; }"),
        vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
    );
}

#[test]
fn global_self_reference_is_left_to_runtime() {
    // Globals are not tracked by the resolver, so this is a runtime error.
    assert_eq!(
        diagnostics("var a = a;"),
        vec!["Undefined variable 'a'.\n[line 1]"]
    );
}

#[test]
fn redeclaring_a_local() {
    assert_eq!(
        diagnostics("{ var a = 1;\n var a = 2; }"),
        vec!["[line 2] Error at 'a': Already a variable with this name in this scope."]
    );
}

#[test]
fn redeclaring_a_global_is_allowed() {
    let mut lox = Lox::new(Capture::default());
    assert!(lox.run("var a = 1; var a = 2; print a;").is_empty());
    assert_eq!(lox.host().output, vec!["2"]);
}

#[test]
fn misplaced_this_and_super() {
    assert_eq!(
        diagnostics("print this;\nfun f() { return super.x; }\nclass A { m() { super.m(); } }"),
        vec![
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
            "[line 2] Error at 'super': Can't use 'super' outside of a class.",
            "[line 3] Error at 'super': Can't use 'super' in a class with no superclass.",
        ]
    );
}

#[test]
fn class_inheriting_from_itself() {
    assert_eq!(
        diagnostics("class Oops < Oops {}"),
        vec!["[line 1] Error at 'Oops': A class can't inherit from itself."]
    );
}

#[test]
fn return_rules() {
    assert_eq!(
        diagnostics("return 1;\nclass A { init() { return 2; } }"),
        vec![
            "[line 1] Error at 'return': Can't return from top-level code.",
            "[line 2] Error at 'return': Can't return a value from an initializer.",
        ]
    );
}

#[test]
fn static_errors_suppress_the_whole_unit() {
    let mut lox = Lox::new(Capture::default());
    let errors = lox.run("print \"before\";\n{ var x = x; }\nprint \"after\";");

    assert_eq!(errors.len(), 1);
    assert!(!errors[0].is_runtime());
    assert_eq!(errors[0].line(), 2);
    assert!(lox.host().output.is_empty());
    assert_eq!(lox.host().diagnostics.len(), 1);
}

#[test]
fn closures_bind_to_the_scope_seen_at_resolution() {
    // Without static resolution the second `show()` would find the later,
    // shadowing `a` in the block.
    let mut lox = Lox::new(Capture::default());
    let source = r#"
        var a = "global";
        {
            fun show() { print a; }
            show();
            var a = "block";
            show();
        }
    "#;

    assert!(lox.run(source).is_empty());
    assert_eq!(lox.host().output, vec!["global", "global"]);
}
