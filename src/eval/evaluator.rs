//! Walks a parsed [`Expr`] tree against a [`SimulationData`], producing a
//! synthetic signal. Every array carries full complex precision internally
//! so `db`/`phase`/`real`/`imag` are always well-defined; real-valued
//! inputs are treated as complex with zero imaginary part.

use num_complex::Complex64;

use crate::error::{Error, Result};
use crate::eval::ast::{BinOp, Expr, UnaryFn};
use crate::model::SimulationData;

#[derive(Debug, Clone)]
pub struct EvalResult {
    pub name: String,
    pub axis: Vec<f64>,
    pub values: Vec<Complex64>,
}

impl EvalResult {
    pub fn real_part(&self) -> Vec<f64> {
        self.values.iter().map(|c| c.re).collect()
    }
}

fn deriv(axis: &[f64], y: &[Complex64]) -> Vec<Complex64> {
    let n = y.len();
    if n < 2 {
        return y.to_vec();
    }
    let mut out = vec![Complex64::new(0.0, 0.0); n];
    out[0] = (y[1] - y[0]) / (axis[1] - axis[0]);
    out[n - 1] = (y[n - 1] - y[n - 2]) / (axis[n - 1] - axis[n - 2]);
    for i in 1..n - 1 {
        out[i] = (y[i + 1] - y[i - 1]) / (axis[i + 1] - axis[i - 1]);
    }
    out
}

fn integ(axis: &[f64], y: &[Complex64]) -> Vec<Complex64> {
    let n = y.len();
    let mut out = vec![Complex64::new(0.0, 0.0); n];
    let mut acc = Complex64::new(0.0, 0.0);
    for i in 1..n {
        let dx = axis[i] - axis[i - 1];
        acc += 0.5 * (y[i] + y[i - 1]) * dx;
        out[i] = acc;
    }
    out
}

fn apply_unary(f: UnaryFn, axis: &[f64], x: &[Complex64], position: usize) -> Result<Vec<Complex64>> {
    let real_unary = |g: fn(f64) -> f64, domain_check: Option<&str>| -> Result<Vec<Complex64>> {
        x.iter()
            .map(|c| {
                if let Some(label) = domain_check {
                    if c.re <= 0.0 {
                        return Err(Error::EvaluationError {
                            message: format!("{label} requires a positive real argument"),
                            position,
                        });
                    }
                }
                Ok(Complex64::new(g(c.re), 0.0))
            })
            .collect()
    };

    match f {
        UnaryFn::Abs => Ok(x.iter().map(|c| Complex64::new(c.norm(), 0.0)).collect()),
        UnaryFn::Sqrt => real_unary(f64::sqrt, Some("sqrt")),
        UnaryFn::Log => real_unary(f64::ln, Some("log")),
        UnaryFn::Log10 => real_unary(f64::log10, Some("log10")),
        UnaryFn::Exp => real_unary(f64::exp, None),
        UnaryFn::Sin => real_unary(f64::sin, None),
        UnaryFn::Cos => real_unary(f64::cos, None),
        UnaryFn::Tan => real_unary(f64::tan, None),
        UnaryFn::Db => Ok(x
            .iter()
            .map(|c| Complex64::new(20.0 * c.norm().max(1e-300).log10(), 0.0))
            .collect()),
        UnaryFn::Phase => Ok(x.iter().map(|c| Complex64::new(c.arg().to_degrees(), 0.0)).collect()),
        UnaryFn::Real => Ok(x.iter().map(|c| Complex64::new(c.re, 0.0)).collect()),
        UnaryFn::Imag => Ok(x.iter().map(|c| Complex64::new(c.im, 0.0)).collect()),
        UnaryFn::Deriv => Ok(deriv(axis, x)),
        UnaryFn::Integ => Ok(integ(axis, x)),
    }
}

fn eval_node(expr: &Expr, data: &SimulationData) -> Result<Vec<Complex64>> {
    match expr {
        Expr::Number(v) => Ok(vec![Complex64::new(*v, 0.0); data.point_count()]),
        Expr::Signal(name) => {
            let signal = data
                .get_signal(name)
                .ok_or_else(|| Error::EvaluationError {
                    message: format!("unknown signal '{name}'"),
                    position: 0,
                })?;
            Ok(signal.as_complex())
        }
        Expr::Neg(inner) => {
            let v = eval_node(inner, data)?;
            Ok(v.iter().map(|c| -c).collect())
        }
        Expr::Call(func, inner, position) => {
            let v = eval_node(inner, data)?;
            apply_unary(*func, data.axis.values(), &v, *position)
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval_node(lhs, data)?;
            let r = eval_node(rhs, data)?;
            if l.len() != r.len() {
                return Err(Error::EvaluationError {
                    message: "operand length mismatch".to_string(),
                    position: 0,
                });
            }
            Ok(l.iter()
                .zip(r.iter())
                .map(|(a, b)| match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => {
                        if b.norm() < 1e-300 {
                            Complex64::new(f64::NAN, 0.0)
                        } else {
                            a / b
                        }
                    }
                })
                .collect())
        }
    }
}

/// Parses and evaluates `expression` against `data`, returning a
/// synthetic signal labelled with the expression text.
pub fn evaluate(expression: &str, data: &SimulationData) -> Result<EvalResult> {
    let ast = crate::eval::parser::parse(expression)?;
    let values = eval_node(&ast, data)?;
    Ok(EvalResult {
        name: expression.to_string(),
        axis: data.axis.values().to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, AxisKind, Signal};

    fn data() -> SimulationData {
        let axis = Axis::new(AxisKind::Time, vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        SimulationData::new(axis)
            .with_signal("V(out)", Signal::Real(vec![0.0, 1.0, 4.0, 9.0]))
            .unwrap()
            .with_signal("V(in)", Signal::Real(vec![1.0, 1.0, 1.0, 1.0]))
            .unwrap()
    }

    #[test]
    fn evaluates_arithmetic_between_signals() {
        let result = evaluate("V(out) + V(in)", &data()).unwrap();
        assert_eq!(result.real_part(), vec![1.0, 2.0, 5.0, 10.0]);
        assert_eq!(result.name, "V(out) + V(in)");
    }

    #[test]
    fn deriv_of_quadratic_is_approximately_linear() {
        let result = evaluate("deriv(V(out))", &data()).unwrap();
        let v = result.real_part();
        assert!((v[1] - 2.0).abs() < 1e-9);
        assert!((v[2] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn integ_then_deriv_roundtrips_approximately() {
        let result = evaluate("deriv(integ(V(in)))", &data()).unwrap();
        let v = result.real_part();
        assert!((v[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_signal_fails_with_position() {
        let err = evaluate("V(missing) * 2", &data()).unwrap_err();
        assert!(matches!(err, Error::EvaluationError { .. }));
    }

    #[test]
    fn sqrt_of_negative_fails_cleanly() {
        let err = evaluate("sqrt(V(out) - 100)", &data()).unwrap_err();
        assert!(matches!(err, Error::EvaluationError { .. }));
    }
}
