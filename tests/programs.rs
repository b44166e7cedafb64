#[cfg(test)]
mod program_tests {
    use mython as my;

    use my::error::{MythonError, RuntimeError};
    use my::interpreter::Interpreter;
    use my::value::{SimpleContext, Value};

    fn run_program(source: &str) -> (Result<Value, MythonError>, String) {
        let mut ctx = SimpleContext::new(Vec::new());
        let result = Interpreter::new().run_source(source, &mut ctx);
        let out = String::from_utf8(ctx.into_inner()).expect("program output is UTF-8");

        (result, out)
    }

    fn assert_output(source: &str, expected: &str) {
        let (result, out) = run_program(source);

        if let Err(e) = result {
            panic!("Program failed with: {}\n--- output so far ---\n{}", e, out);
        }

        assert_eq!(out, expected, "Output mismatch for program:\n{}", source);
    }

    #[test]
    fn test_program_01_rect_area() {
        assert_output(
            "\
class Rect:
  def __init__(w, h):
    self.w = w
    self.h = h

  def area():
    return self.w * self.h

r = Rect(3, 4)
print r.area()
",
            "12\n",
        );
    }

    #[test]
    fn test_program_02_inheritance_and_str() {
        assert_output(
            "\
class Animal:
  def __init__(name):
    self.name = name

  def speak():
    return 'generic'

  def __str__():
    return self.name + ' says ' + self.speak()

class Dog(Animal):
  def speak():
    return 'woof'

d = Dog('Rex')
print d
print Animal('Cat')
",
            "Rex says woof\nCat says generic\n",
        );
    }

    #[test]
    fn test_program_03_user_comparisons() {
        assert_output(
            "\
class Num:
  def __init__(v):
    self.v = v
  def __eq__(other):
    return self.v == other.v
  def __lt__(other):
    return self.v < other.v

a = Num(1)
b = Num(2)
print a == b, a < b, a > b, a <= b, a >= b, a != b
",
            "False True False True False True\n",
        );
    }

    #[test]
    fn test_program_04_control_flow_and_expressions() {
        assert_output(
            "\
x = 10
if x > 5 and not x == 7:
  print 'big'
else:
  print 'small'
print str(x) + '!', -x + 3, (1 + 2) * 3
print 'a' < 'b', not '', True or False
",
            "big\n10! -7 9\nTrue True True\n",
        );
    }

    #[test]
    fn test_program_05_nested_returns() {
        assert_output(
            "\
class Sign:
  def of(x):
    if x < 0:
      return 'neg'
    else:
      if x == 0:
        return 'zero'
    return 'pos'

s = Sign()
print s.of(-3), s.of(0), s.of(8)
",
            "neg zero pos\n",
        );
    }

    #[test]
    fn test_program_06_self_mutation_and_chaining() {
        assert_output(
            "\
class Counter:
  def __init__():
    self.n = 0
  def inc():
    self.n = self.n + 1
    return self

c = Counter()
c.inc().inc().inc()
print c.n
",
            "3\n",
        );
    }

    #[test]
    fn test_program_07_explicit_self_comments_and_bare_return() {
        assert_output(
            "\
# leading comment
class Q:
  # inside the class
  def get(self):
    return 42 # trailing

  def nothing():
    return

print Q().get(), Q().nothing()
",
            "42 None\n",
        );
    }

    #[test]
    fn test_program_08_nested_objects() {
        assert_output(
            "\
class Point:
  def __init__(x, y):
    self.x = x
    self.y = y
  def __add__(other):
    return self.x * self.y + other.x * other.y
  def __str__():
    return '(' + str(self.x) + ', ' + str(self.y) + ')'

class Segment:
  def __init__(a, b):
    self.a = a
    self.b = b

s = Segment(Point(1, 2), Point(3, 4))
s.b.x = 10
print s.a + s.b
print s.a, s.b, s.b.x
",
            "42\n(1, 2) (10, 4) 10\n",
        );
    }

    #[test]
    fn test_program_09_globals_persist_between_runs() {
        let mut ctx = SimpleContext::new(Vec::new());
        let mut interpreter = Interpreter::new();

        interpreter
            .run_source("x = 5\n", &mut ctx)
            .expect("first program runs");
        interpreter
            .run_source("print x * 2\n", &mut ctx)
            .expect("second program sees x");

        assert_eq!(ctx.into_inner(), b"10\n");
    }

    #[test]
    fn test_program_10_errors_and_exit_codes() {
        let (result, out) = run_program("print 'before'\nprint 1 / 0\nprint 'after'\n");
        assert_eq!(out, "before\n", "output up to the failure is kept");
        match result {
            Err(e @ MythonError::Runtime(RuntimeError::DivisionByZero)) => {
                assert_eq!(e.exit_code(), 70)
            }
            other => panic!("Expected DivisionByZero, got {:?}", other),
        }

        let (result, _) = run_program("x = 1\n   y = 2\n");
        match result {
            Err(e @ MythonError::Lex(_)) => assert_eq!(e.exit_code(), 65),
            other => panic!("Expected a lexical error, got {:?}", other),
        }

        let (result, out) = run_program("x = Missing()\n");
        assert!(out.is_empty(), "nothing runs when parsing fails");
        match result {
            Err(e @ MythonError::Parse { .. }) => {
                assert_eq!(e.exit_code(), 65);
                assert!(
                    e.to_string().contains("Missing"),
                    "Error should name the class, got: {}",
                    e
                );
            }
            other => panic!("Expected a parse error, got {:?}", other),
        }

        let (result, _) = run_program("print y\n");
        assert!(matches!(
            result,
            Err(MythonError::Runtime(RuntimeError::NameNotFound(_)))
        ));
    }

    #[test]
    fn test_program_11_comment_lines_in_method_body() {
        assert_output(
            "\
class C:
  def f():
    # first
    x = 1
    # second
    return x

print C().f()
",
            "1\n",
        );
    }
}
