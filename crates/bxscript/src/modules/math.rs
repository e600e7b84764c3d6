//! Math module: constants and the usual float functions.
//!
//! The surface is deliberately lenient: calling a math function with
//! anything but a number yields Null rather than raising.

use rand::Rng;
use strum::Display;

use crate::{
    exception::RunResult,
    heap::Heap,
    modules::{NativeFn, module_object},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum MathFn {
    Abs,
    Ceil,
    Floor,
    Round,
    Trunc,
    Sqrt,
    Cbrt,
    Pow,
    Exp,
    Log,
    Log2,
    Log10,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Min,
    Max,
    Random,
}

pub(crate) fn install(heap: &mut Heap) -> Value {
    let module = module_object(
        heap,
        &[
            ("abs", NativeFn::Math(MathFn::Abs)),
            ("ceil", NativeFn::Math(MathFn::Ceil)),
            ("floor", NativeFn::Math(MathFn::Floor)),
            ("round", NativeFn::Math(MathFn::Round)),
            ("trunc", NativeFn::Math(MathFn::Trunc)),
            ("sqrt", NativeFn::Math(MathFn::Sqrt)),
            ("cbrt", NativeFn::Math(MathFn::Cbrt)),
            ("pow", NativeFn::Math(MathFn::Pow)),
            ("exp", NativeFn::Math(MathFn::Exp)),
            ("log", NativeFn::Math(MathFn::Log)),
            ("log2", NativeFn::Math(MathFn::Log2)),
            ("log10", NativeFn::Math(MathFn::Log10)),
            ("sin", NativeFn::Math(MathFn::Sin)),
            ("cos", NativeFn::Math(MathFn::Cos)),
            ("tan", NativeFn::Math(MathFn::Tan)),
            ("asin", NativeFn::Math(MathFn::Asin)),
            ("acos", NativeFn::Math(MathFn::Acos)),
            ("atan", NativeFn::Math(MathFn::Atan)),
            ("sinh", NativeFn::Math(MathFn::Sinh)),
            ("cosh", NativeFn::Math(MathFn::Cosh)),
            ("tanh", NativeFn::Math(MathFn::Tanh)),
            ("min", NativeFn::Math(MathFn::Min)),
            ("max", NativeFn::Math(MathFn::Max)),
            ("random", NativeFn::Math(MathFn::Random)),
        ],
    );
    let Value::Ref(id) = module else { unreachable!() };
    if let crate::heap::HeapData::Object(properties) = heap.get_mut(id) {
        properties.insert("PI".to_owned(), Value::Number(std::f64::consts::PI));
    }
    module
}

fn unary(args: &[Value], f: impl Fn(f64) -> f64) -> Value {
    match args.first() {
        Some(Value::Number(n)) => Value::Number(f(*n)),
        _ => Value::Null,
    }
}

fn fold(args: &[Value], f: impl Fn(f64, f64) -> f64) -> Value {
    let mut numbers = args.iter().filter_map(|a| a.as_number());
    let Some(first) = numbers.next() else {
        return Value::Null;
    };
    Value::Number(numbers.fold(first, f))
}

pub(crate) fn call(_heap: &mut Heap, func: MathFn, args: &[Value]) -> RunResult<Value> {
    let result = match func {
        MathFn::Abs => unary(args, f64::abs),
        MathFn::Ceil => unary(args, f64::ceil),
        MathFn::Floor => unary(args, f64::floor),
        MathFn::Round => unary(args, f64::round),
        MathFn::Trunc => unary(args, f64::trunc),
        MathFn::Sqrt => unary(args, f64::sqrt),
        MathFn::Cbrt => unary(args, f64::cbrt),
        MathFn::Exp => unary(args, f64::exp),
        MathFn::Log => unary(args, f64::ln),
        MathFn::Log2 => unary(args, f64::log2),
        MathFn::Log10 => unary(args, f64::log10),
        MathFn::Sin => unary(args, f64::sin),
        MathFn::Cos => unary(args, f64::cos),
        MathFn::Tan => unary(args, f64::tan),
        MathFn::Asin => unary(args, f64::asin),
        MathFn::Acos => unary(args, f64::acos),
        MathFn::Atan => unary(args, f64::atan),
        MathFn::Sinh => unary(args, f64::sinh),
        MathFn::Cosh => unary(args, f64::cosh),
        MathFn::Tanh => unary(args, f64::tanh),
        MathFn::Pow => match (args.first(), args.get(1)) {
            (Some(Value::Number(base)), Some(Value::Number(exp))) => Value::Number(base.powf(*exp)),
            _ => Value::Null,
        },
        MathFn::Min => fold(args, f64::min),
        MathFn::Max => fold(args, f64::max),
        MathFn::Random => Value::Number(rand::thread_rng().gen_range(0.0..1.0)),
    };
    Ok(result)
}
