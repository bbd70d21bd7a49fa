//! Documentation content for the ognl CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Syntax,
    Operators,
    Navigation,
    Collections,
    Statics,
    Lambdas,
    Types,
    Source,
}

impl DocCategory {
    pub const ALL: [DocCategory; 8] = [
        DocCategory::Syntax,
        DocCategory::Operators,
        DocCategory::Navigation,
        DocCategory::Collections,
        DocCategory::Statics,
        DocCategory::Lambdas,
        DocCategory::Types,
        DocCategory::Source,
    ];

    /// Parse category name from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "syntax" => Some(Self::Syntax),
            "operators" | "ops" => Some(Self::Operators),
            "navigation" | "chains" | "properties" => Some(Self::Navigation),
            "collections" | "projection" | "selection" => Some(Self::Collections),
            "statics" | "static" | "constructors" => Some(Self::Statics),
            "lambdas" | "lambda" | "variables" => Some(Self::Lambdas),
            "types" | "type" | "numbers" => Some(Self::Types),
            "source" | "compile" => Some(Self::Source),
            _ => None,
        }
    }

    pub fn content(self) -> &'static str {
        match self {
            DocCategory::Syntax => SYNTAX_DOC,
            DocCategory::Operators => OPERATORS_DOC,
            DocCategory::Navigation => NAVIGATION_DOC,
            DocCategory::Collections => COLLECTIONS_DOC,
            DocCategory::Statics => STATICS_DOC,
            DocCategory::Lambdas => LAMBDAS_DOC,
            DocCategory::Types => TYPES_DOC,
            DocCategory::Source => SOURCE_DOC,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"OGNL DOCUMENTATION

OGNL navigates object graphs. An expression is evaluated against a root
object: bare names read properties of the root, dots chain further steps,
and operators combine the results.

DOCUMENTATION CATEGORIES

  syntax            Literals, references, sequences and assignment
  operators         Arithmetic, bitwise, comparison and logical operators
  navigation        Properties, methods, indexes, chains and null safety
  collections       List, map and array literals; projection and selection
  statics           Static fields and methods, constructors, instanceof
  lambdas           Variables, lambdas and evaluation nodes
  types             The numeric widening lattice and conversions
  source            Generating accessor source for an expression

QUICK REFERENCE

  name              Property of the root
  a.b.c             Chain of properties
  a?.b              Null-safe step
  items[0]          Index (evaluated against the root)
  items[^] [|] [$]  First, middle and last element
  m(x)              Method call
  #this  #root  #v  Current object, root, variable
  .{ e }            Projection
  .{? e }           Selection

Run 'ognl doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    DocCategory::from_str(name)
        .map(DocCategory::content)
        .ok_or_else(|| CliError::UnknownCategory(name.to_string()))
}

const SYNTAX_DOC: &str = r#"SYNTAX - Literals, References and Sequences

LITERALS
  42  42L  42H  1.5  1.5F  1.5B  0x1F
    int, long, BigInteger, double, float, BigDecimal, hex int.
    Integers too large for int are read as long.

  "text"  'c'  'text'
    Strings; a single-quoted single character is a char.

  true  false  null

REFERENCES
  #this     The object the current step is applied to
  #root     The root object of the evaluation
  #name     A variable set on the context

SEQUENCES
  a, b, c
    Evaluates every expression and yields the last.

    Example:
      Input:  {"x": 1}
      Query:  #y = x + 1, #y * 10
      Output: 20

ASSIGNMENT
  lhs = rhs
    Assigns through the left side and yields the assigned value.
    Properties, indexes, variables and #root are assignable; literals
    and #this are not.
"#;

const OPERATORS_DOC: &str = r#"OPERATORS - Arithmetic, Comparison and Logic

ARITHMETIC
  +  -  *  /  %
    Operands widen to the wider type on the numeric lattice.
    + concatenates when either operand is a string.

    Example:
      Query:  1 + 2L
      Output: 3 (long)

      Query:  "n=" + 5
      Output: "n=5"

BITWISE
  &  |  ^  ~  <<  >>  >>>
  band  bor  xor  shl  shr  ushr

COMPARISON
  ==  !=  <  >  <=  >=
  eq  neq  lt  gt  lte  gte
    Numbers compare by value across types; strings compare lexically.

MEMBERSHIP
  a in list      a not in list

LOGICAL
  &&  ||  !      and  or  not
    && and || yield the deciding operand, not a boolean, and stop at the
    first operand that decides the result.

    Example:
      Query:  "" || "fallback"
      Output: "fallback"

CONDITIONAL
  cond ? a : b
"#;

const NAVIGATION_DOC: &str = r#"NAVIGATION - Properties, Methods and Chains

PROPERTIES
  name          Map key, bean property or registered getter
  a.b.c         Each step applies to the result of the previous one

INDEXES
  items[0]      Position in a list or array
  map["key"]    Map entry
  items[^]      First element
  items[|]      Middle element
  items[$]      Last element
  items[*]      The whole sequence (a copy when read)

    Index expressions are evaluated against the root, not the current
    object.

METHODS
  name.length()  items.size()  text.substring(1, 3)
    Arguments are evaluated against the root.

NULL SAFETY
  a?.b.c
    A null result anywhere in the chain yields null.

  a.b with a null root
    A chain starting from null yields null when its first step is a
    property. A leading method call on null still fails.
"#;

const COLLECTIONS_DOC: &str = r#"COLLECTIONS - Literals, Projection and Selection

LITERALS
  { 1, 2, 3 }                   List
  #{ "a" : 1, "b" : 2 }         Map
  #@java.util.HashMap@{ ... }   Map tagged with a class
  new int[] { 1, 2 }            Array with items
  new int[3]                    Array of default values

PROJECTION
  items.{ #this * 2 }
    Evaluates the body once per element. Maps project their values.

SELECTION
  items.{? #this > 2 }    Every match
  items.{^ #this > 2 }    First match, as a one-element list
  items.{$ #this > 2 }    Last match, as a one-element list

    Example:
      Query:  {1, 2, 3, 4}.{? #this > 2 }
      Output: [3, 4]
"#;

const STATICS_DOC: &str = r#"STATICS - Classes, Static Members and Constructors

STATIC FIELDS
  @java.lang.Integer@MAX_VALUE
  @Math@PI
    Bare class names are also looked up under java.lang.

STATIC METHODS
  @Math@max(3, 4)

CONSTRUCTORS
  new java.util.ArrayList()
  new StringBuilder("x")

TYPE TESTS
  x instanceof Number
"#;

const LAMBDAS_DOC: &str = r#"LAMBDAS - Variables, Lambdas and Evaluation

VARIABLES
  #total = 0, items.{ #total = #total + #this }, #total

LAMBDAS
  :[ #this * 2 ]
    A lambda is a value holding an unevaluated expression.

EVALUATION
  #double = :[ #this * 2 ], #double(21)
  ("1 + 2")(0)
    Runs the expression with the argument as both #this and #root.
    The previous root is restored afterwards.

    Example:
      Query:  #fact = :[ #this <= 1 ? 1 : #this * #fact(#this - 1) ], #fact(5)
      Output: 120
"#;

const TYPES_DOC: &str = r#"TYPES - Numbers and Conversion

WIDENING LATTICE
  boolean < byte < char < short < int < long < BigInteger
          < float < double < BigDecimal

    Binary arithmetic computes in the wider operand type. Results of
    boolean and char operands are int. Strings are parsed for every
    operator except +.

TRUTHINESS
  null, false, zero, '\0' and "" are false; everything else is true.

CONVERSION
  Assignments to typed bean properties and array elements convert the
  value, parsing strings strictly.
"#;

const SOURCE_DOC: &str = r#"SOURCE - Accessor Source Generation

  ognl source <EXPR> [--input JSON]

    Renders the getter and setter accessor equivalent to an expression,
    evaluated against the input as a sample root.

    Example:
      Input:  {"user": {"name": "Ada"}}
      Query:  user.name
      Output: get: target.key("user").key("name")
              set: target.key("user").set_key("name", $value)

    Map literals, projections, selections, lambdas, evaluations and
    null-safe chains have no source form; the expression is reported as
    interpreted instead.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_resolves_by_name() {
        for category in DocCategory::ALL {
            let name = format!("{:?}", category).to_lowercase();
            assert_eq!(DocCategory::from_str(&name), Some(category));
            assert!(get_doc_category(&name).is_ok());
        }
        assert!(matches!(get_doc_category("nope"), Err(CliError::UnknownCategory(_))));
    }
}
