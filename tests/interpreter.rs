use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use treelox as lox;

use lox::lox::Lox;

/// Cloneable `Write` sink: the test keeps one handle, the interpreter the
/// other, so output can be inspected after the run.
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("program output is UTF-8")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(source: &str) -> (String, bool, bool) {
    let buf = SharedBuf::default();
    let mut session = Lox::with_output(Box::new(buf.clone()));

    session.run(source.as_bytes());

    (
        buf.contents(),
        session.had_error(),
        session.had_runtime_error(),
    )
}

/// Runs a program expected to finish cleanly and returns its exact stdout.
fn run_ok(source: &str) -> String {
    let (output, had_error, had_runtime_error) = run(source);
    assert!(!had_error, "compile error in {:?}", source);
    assert!(!had_runtime_error, "runtime error in {:?}", source);
    output
}

/// Runs a program expected to hit a runtime error; returns its stdout.
fn run_runtime_error(source: &str) -> String {
    let (output, had_error, had_runtime_error) = run(source);
    assert!(!had_error, "compile error in {:?}", source);
    assert!(had_runtime_error, "expected runtime error in {:?}", source);
    output
}

// ─────────────────────────────────────────────────────────────────────────
// End-to-end scenarios
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn closures_capture_the_declaration_scope() {
    // The resolver pins `a` inside `show` to the outer scope, so the later
    // shadowing declaration is invisible to it.
    let source = r#"
var a = "global";
{
  fun show() { print a; }
  show();
  var a = "inner";
  show();
}
"#;
    assert_eq!(run_ok(source), "global\nglobal\n");
}

#[test]
fn recursive_fibonacci() {
    let source = r#"
fun fib(n) { if (n < 2) return n; return fib(n-1) + fib(n-2); }
print fib(10);
"#;
    assert_eq!(run_ok(source), "55\n");
}

#[test]
fn methods_are_called_through_instances() {
    let source = r#"
class Bacon { eat() { print "crunch"; } }
Bacon().eat();
"#;
    assert_eq!(run_ok(source), "crunch\n");
}

#[test]
fn initializer_arguments_bind_fields() {
    let source = r#"
class P { init(x) { this.x = x; } }
var p = P(3);
print p.x;
"#;
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn plus_overloads() {
    assert_eq!(
        run_ok(r#"print "x=" + 2; print 3 + " items"; print 1 + 2;"#),
        "x=2\n3 items\n3\n"
    );
}

#[test]
fn for_loop_desugars_and_break_exits() {
    let source = "for (var i = 0; i < 5; i = i + 1) { if (i == 3) break; print i; }";
    assert_eq!(run_ok(source), "0\n1\n2\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Value semantics
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn only_nil_and_false_are_falsey() {
    assert_eq!(
        run_ok(r#"print !nil; print !false; print !0; print !""; print !clock;"#),
        "true\ntrue\nfalse\nfalse\nfalse\n"
    );
}

#[test]
fn equality_is_structural_and_kind_strict() {
    assert_eq!(
        run_ok(
            r#"
print 1 == 1;
print nil == nil;
print nil == false;
print 0 == false;
print "a" == "a";
print "a" != "b";
"#
        ),
        "true\ntrue\nfalse\nfalse\ntrue\ntrue\n"
    );
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    assert_eq!(
        run_ok("print 1 or 2; print nil or 2; print nil and 2; print 1 and 2;"),
        "1\n2\nnil\n2\n"
    );
}

#[test]
fn logical_operators_short_circuit() {
    let source = r#"
fun loud(v) { print "evaluated"; return v; }
true or loud(1);
false and loud(2);
"#;
    assert_eq!(run_ok(source), "");
}

#[test]
fn conditional_evaluates_exactly_one_branch() {
    let source = r#"
fun loud(v) { print v; return v; }
true ? loud(1) : loud(2);
false ? loud(3) : loud(4);
"#;
    assert_eq!(run_ok(source), "1\n4\n");
}

#[test]
fn comma_evaluates_left_to_right_and_yields_the_right() {
    assert_eq!(run_ok("print (1, 2);"), "2\n");

    let source = r#"
fun loud(v) { print v; return v; }
print (loud(1), loud(2));
"#;
    assert_eq!(run_ok(source), "1\n2\n2\n");
}

#[test]
fn assignment_evaluates_to_the_assigned_value() {
    assert_eq!(run_ok("var a = 1; print a = 2; print a;"), "2\n2\n");
}

#[test]
fn numbers_print_shortest_round_trip() {
    assert_eq!(
        run_ok("print 4 / 2; print 10 / 4; print 0.1 + 0.2;"),
        "2\n2.5\n0.30000000000000004\n"
    );
}

#[test]
fn printed_representations() {
    let source = r#"
fun f() {}
class A {}
print f;
print clock;
print A;
print A();
print fun () {};
"#;
    assert_eq!(
        run_ok(source),
        "<function: f>\n<native function: clock>\nA\nA instance\n<anonymous function>\n"
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Variables, scopes, closures
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn blocks_shadow_and_restore() {
    let source = r#"
var a = "outer";
{
  var a = "inner";
  print a;
}
print a;
"#;
    assert_eq!(run_ok(source), "inner\nouter\n");
}

#[test]
fn closures_share_mutable_state() {
    let source = r#"
fun makeCounter() {
  var i = 0;
  fun count() { i = i + 1; print i; }
  return count;
}
var counter = makeCounter();
counter();
counter();
"#;
    assert_eq!(run_ok(source), "1\n2\n");
}

#[test]
fn top_level_var_may_read_itself_as_nil() {
    assert_eq!(run_ok("var a = a; print a;"), "nil\n");
}

#[test]
fn while_loop_runs_to_falsey_condition() {
    assert_eq!(
        run_ok("var i = 0; while (i < 3) { print i; i = i + 1; }"),
        "0\n1\n2\n"
    );
}

#[test]
fn break_only_exits_the_innermost_loop() {
    let source = r#"
for (var i = 0; i < 2; i = i + 1) {
  for (var j = 0; j < 5; j = j + 1) {
    if (j == 1) break;
    print i + j * 10;
  }
}
"#;
    assert_eq!(run_ok(source), "0\n1\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Functions and classes
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn function_without_return_yields_nil() {
    assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
}

#[test]
fn anonymous_functions_are_values() {
    assert_eq!(
        run_ok("var twice = fun (x) { return x + x; }; print twice(21);"),
        "42\n"
    );
}

#[test]
fn early_return_from_initializer_yields_the_instance() {
    let source = r#"
class P { init() { this.x = 1; return; } }
print P().x;
"#;
    assert_eq!(run_ok(source), "1\n");
}

#[test]
fn calling_init_directly_returns_the_instance() {
    let source = r#"
class P { init() { this.x = 1; } }
var p = P();
print p.init();
"#;
    assert_eq!(run_ok(source), "P instance\n");
}

#[test]
fn fields_shadow_methods() {
    let source = r#"
class A { m() { return 1; } }
var a = A();
a.m = 2;
print a.m;
"#;
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn methods_can_refer_to_their_class() {
    let source = r#"
class A { make() { return A(); } }
print A().make();
"#;
    assert_eq!(run_ok(source), "A instance\n");
}

#[test]
fn bound_methods_remember_their_instance() {
    let source = r#"
class Cake {
  flavor() { print this.kind; }
}
var cake = Cake();
cake.kind = "chocolate";
var f = cake.flavor;
f();
"#;
    assert_eq!(run_ok(source), "chocolate\n");
}

#[test]
fn clock_is_a_number_of_seconds() {
    assert_eq!(run_ok("print clock() > 0;"), "true\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Runtime errors
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn division_by_zero_is_a_runtime_error() {
    assert_eq!(run_runtime_error("print 1 / 0;"), "");
}

#[test]
fn arithmetic_requires_numbers() {
    assert_eq!(run_runtime_error(r#"print -"x";"#), "");
    assert_eq!(run_runtime_error(r#"print 1 < "2";"#), "");
    assert_eq!(run_runtime_error("print nil + 1;"), "");
}

#[test]
fn undefined_variable_read_is_a_runtime_error() {
    assert_eq!(run_runtime_error("print missing;"), "");
}

#[test]
fn undefined_variable_assignment_is_a_runtime_error() {
    assert_eq!(run_runtime_error("missing = 1;"), "");
}

#[test]
fn arity_mismatch_reports_without_invoking_the_callee() {
    let source = r#"
fun f(a) { print "ran"; }
f(1, 2);
"#;
    // No "ran": the callee body never starts.
    assert_eq!(run_runtime_error(source), "");
}

#[test]
fn zero_parameter_function_rejects_arguments() {
    assert_eq!(run_runtime_error("fun f() {} f(1);"), "");
}

#[test]
fn only_functions_and_classes_are_callable() {
    assert_eq!(run_runtime_error(r#""not callable"();"#), "");
}

#[test]
fn property_access_requires_an_instance() {
    assert_eq!(run_runtime_error("var x = 1; print x.y;"), "");
    assert_eq!(run_runtime_error("var x = 1; x.y = 2;"), "");
}

#[test]
fn undefined_property_is_a_runtime_error() {
    assert_eq!(run_runtime_error("class A {} print A().missing;"), "");
}

#[test]
fn script_mode_continues_after_a_runtime_error() {
    assert_eq!(run_runtime_error("print 1 / 0; print 2;"), "2\n");
}

#[test]
fn compile_errors_skip_execution() {
    let (output, had_error, had_runtime_error) = run("print 1; var = 2;");
    assert!(had_error);
    assert!(!had_runtime_error);
    assert_eq!(output, "");
}

#[test]
fn scan_errors_skip_execution() {
    let (output, had_error, _) = run("print 1; @");
    assert!(had_error);
    assert_eq!(output, "");
}

// ─────────────────────────────────────────────────────────────────────────
// REPL mode
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn repl_echoes_a_bare_expression() {
    let buf = SharedBuf::default();
    let mut session = Lox::with_output(Box::new(buf.clone()));

    session.run_line("1 + 2");

    assert!(!session.had_error());
    assert_eq!(buf.contents(), "3\n");
}

#[test]
fn repl_runs_statements_before_the_trailing_expression() {
    let buf = SharedBuf::default();
    let mut session = Lox::with_output(Box::new(buf.clone()));

    session.run_line("var a = 5; a * 2");

    assert_eq!(buf.contents(), "10\n");
}

#[test]
fn repl_state_persists_across_lines() {
    let buf = SharedBuf::default();
    let mut session = Lox::with_output(Box::new(buf.clone()));

    session.run_line("fun add(a, b) { return a + b; }");
    session.run_line("add(3, 4)");

    assert_eq!(buf.contents(), "7\n");
}

#[test]
fn repl_node_ids_stay_unique_across_lines() {
    // The first line records hop distances for its local uses.  If a later
    // line reused the same node ids, its globals would wrongly resolve
    // through the stale entries.
    let buf = SharedBuf::default();
    let mut session = Lox::with_output(Box::new(buf.clone()));

    session.run_line("{ var a = 1; { print a; } }");
    session.run_line("var a = 5; a");

    assert!(!session.had_runtime_error());
    assert_eq!(buf.contents(), "1\n5\n");
}

#[test]
fn repl_runtime_error_ends_the_line() {
    let buf = SharedBuf::default();
    let mut session = Lox::with_output(Box::new(buf.clone()));

    session.run_line("var a = 1 / 0; a");

    assert!(session.had_runtime_error());
    assert_eq!(buf.contents(), "");
}

#[test]
fn repl_terminated_statement_is_not_echoed() {
    let buf = SharedBuf::default();
    let mut session = Lox::with_output(Box::new(buf.clone()));

    session.run_line("var a = 1;");

    assert_eq!(buf.contents(), "");
}
