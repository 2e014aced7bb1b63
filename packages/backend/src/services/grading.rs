use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::sandbox::{ExecutionOutput, Sandbox, SandboxError};
use crate::store::PracticeProblem;

// ========== Types ==========

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub input: Vec<Value>,
    pub expected: Value,
    pub actual: Option<Value>,
    pub passed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub passed: bool,
    pub cases: Vec<CaseResult>,
    /// Captured stdout across all cases
    pub stdout: String,
    /// Set when the code was run without test cases and raised
    pub error: Option<String>,
}

impl GradeReport {
    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.passed).count()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ========== Value comparison ==========

/// Equality on returned values where numbers compare numerically, so `3`
/// matches `3.0` the way the teaching language compares them.
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) if a.is_f64() || b.is_f64() => x == y,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, x)| b.get(k).is_some_and(|y| values_match(x, y)))
        }
        _ => actual == expected,
    }
}

// ========== Grading ==========

/// Runs every test case of `problem` against `code`. Sandbox errors mark the
/// affected case failed; grading itself never fails.
pub async fn grade(sandbox: &dyn Sandbox, problem: &PracticeProblem, code: &str) -> GradeReport {
    if problem.test_cases.is_empty() {
        return grade_by_running(sandbox, code).await;
    }

    let mut cases = Vec::with_capacity(problem.test_cases.len());
    let mut stdout = String::new();

    for case in &problem.test_cases {
        let result = sandbox.call(code, &problem.function_name, &case.input).await;
        let case_result = match result {
            Ok(outcome) => {
                stdout.push_str(&outcome.stdout);
                let passed = values_match(&outcome.value, &case.expected);
                CaseResult {
                    input: case.input.clone(),
                    expected: case.expected.clone(),
                    actual: Some(outcome.value),
                    passed,
                    error: None,
                }
            }
            Err(err) => {
                if let SandboxError::Exception { stdout: partial, .. } = &err {
                    stdout.push_str(partial);
                }
                CaseResult {
                    input: case.input.clone(),
                    expected: case.expected.clone(),
                    actual: None,
                    passed: false,
                    error: Some(err.to_string()),
                }
            }
        };
        cases.push(case_result);
    }

    let passed = cases.iter().all(|c| c.passed);
    debug!(problem_id = %problem.id, passed, cases = cases.len(), "graded submission");

    GradeReport {
        passed,
        cases,
        stdout,
        error: None,
    }
}

/// Problems without test cases pass when the code runs without raising.
async fn grade_by_running(sandbox: &dyn Sandbox, code: &str) -> GradeReport {
    let output = ExecutionOutput::from_result(sandbox.run(code).await);

    GradeReport {
        passed: output.is_success(),
        cases: Vec::new(),
        stdout: output.stdout,
        error: output.error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::CallOutcome;
    use crate::store::TestCase;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::json;

    /// Treats the source as a formula over `a` and `b`: "sum", "product" or "raise".
    struct FormulaSandbox;

    #[async_trait]
    impl Sandbox for FormulaSandbox {
        async fn run(&self, code: &str) -> Result<ExecutionOutput, SandboxError> {
            Ok(ExecutionOutput {
                stdout: "ran\n".to_string(),
                error: (code == "raise").then(|| "Traceback: boom".to_string()),
            })
        }

        async fn call(&self, source: &str, _function: &str, args: &[Value]) -> Result<CallOutcome, SandboxError> {
            let a = args[0].as_i64().unwrap_or(0);
            let b = args[1].as_i64().unwrap_or(0);
            let value = match source {
                "sum" => json!(a + b),
                "product" => json!(a * b),
                "float-sum" => json!((a + b) as f64),
                _ => {
                    return Err(SandboxError::Exception {
                        message: "NameError".to_string(),
                        stdout: "partial\n".to_string(),
                    })
                }
            };
            Ok(CallOutcome {
                value,
                stdout: format!("{a},{b}\n"),
            })
        }
    }

    fn problem(test_cases: Vec<TestCase>) -> PracticeProblem {
        PracticeProblem {
            id: "add".to_string(),
            title: "Add two numbers".to_string(),
            description: "Return a + b".to_string(),
            difficulty: Some("beginner".to_string()),
            order_number: 1,
            starter_code: Some("def add(a, b):\n    pass\n".to_string()),
            function_name: "add".to_string(),
            test_cases,
            topics: vec![],
        }
    }

    fn add_cases() -> Vec<TestCase> {
        vec![
            TestCase { input: vec![json!(1), json!(2)], expected: json!(3) },
            TestCase { input: vec![json!(2), json!(2)], expected: json!(4) },
        ]
    }

    #[tokio::test]
    async fn test_correct_solution_passes() {
        let report = grade(&FormulaSandbox, &problem(add_cases()), "sum").await;
        assert!(report.passed);
        assert_eq!(report.passed_count(), 2);
        assert_eq!(report.stdout, "1,2\n2,2\n");
    }

    #[tokio::test]
    async fn test_wrong_solution_fails_some_cases() {
        let report = grade(&FormulaSandbox, &problem(add_cases()), "product").await;
        assert!(!report.passed);
        // 2 * 2 == 2 + 2
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.cases[0].actual, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_exception_marks_case_failed() {
        let report = grade(&FormulaSandbox, &problem(add_cases()), "broken").await;
        assert!(!report.passed);
        assert!(report.cases.iter().all(|c| c.error.as_deref() == Some("NameError")));
        assert_eq!(report.stdout, "partial\npartial\n");
    }

    #[tokio::test]
    async fn test_float_result_matches_int_expectation() {
        let report = grade(&FormulaSandbox, &problem(add_cases()), "float-sum").await;
        assert!(report.passed);
    }

    #[tokio::test]
    async fn test_no_cases_grades_by_running() {
        let ok = grade(&FormulaSandbox, &problem(vec![]), "print('x')").await;
        assert!(ok.passed);
        assert_eq!(ok.stdout, "ran\n");

        let failed = grade(&FormulaSandbox, &problem(vec![]), "raise").await;
        assert!(!failed.passed);
        assert_eq!(failed.error.as_deref(), Some("Traceback: boom"));
    }

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,3}", inner, 0..3)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_values_match_is_reflexive(value in json_value()) {
            prop_assert!(values_match(&value, &value));
        }

        #[test]
        fn prop_int_matches_same_float(n in -1_000_000i64..1_000_000) {
            prop_assert!(values_match(&json!(n), &json!(n as f64)));
            prop_assert!(!values_match(&json!(n), &json!(n as f64 + 0.5)));
        }
    }

    #[test]
    fn test_values_match() {
        assert!(values_match(&json!(3), &json!(3.0)));
        assert!(!values_match(&json!(3), &json!(4)));
        assert!(!values_match(&json!(1), &json!(true)));
        assert!(values_match(&json!([1, [2.0, "a"]]), &json!([1.0, [2, "a"]])));
        assert!(!values_match(&json!([1, 2]), &json!([1, 2, 3])));
        assert!(values_match(&json!({"a": 1, "b": [2]}), &json!({"b": [2.0], "a": 1})));
        assert!(!values_match(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(values_match(&json!(null), &json!(null)));
    }
}
