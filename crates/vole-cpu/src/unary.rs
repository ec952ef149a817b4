// Unary transforms — dest[p] = f(src[offset(p)])
//
// Every unary kernel is the same loop: walk the source view in row-major
// order and write f(value) to the destination at the logical position. That
// loop is written exactly once per layout family (`map_contiguous`,
// `map_strided`) and parameterized by the scalar function. The catalogue of
// scalar functions lives in `scalar`, and `dispatch_unary!` pairs each
// `UnaryOp` variant with its function so no iteration is duplicated.
//
// SOURCE MODES:
//
//   Some(src) — out-of-place: dst is written contiguously by logical
//               position, whatever the source strides are.
//   None      — in-place: dst is also the source. Each slot the walker
//               yields is read and overwritten in place, so any stride
//               pattern is valid.
//
// The kernels never validate their inputs. Shape/stride/buffer agreement is
// the caller's contract; see `crate::storage` for the checked entry points.

use std::fmt;
use std::str::FromStr;

use vole_core::{Error, KernelFloat, Layout};

/// Pair a `UnaryOp` with its scalar function and hand it to `$body`.
macro_rules! dispatch_unary {
    ($op:expr, $T:ty, |$f:ident| $body:expr) => {{
        match $op {
            UnaryOp::Copy => {
                let $f = scalar::copy::<$T>;
                $body
            }
            UnaryOp::Neg => {
                let $f = scalar::neg::<$T>;
                $body
            }
            UnaryOp::Recip => {
                let $f = scalar::recip::<$T>;
                $body
            }
            UnaryOp::Exp => {
                let $f = scalar::exp::<$T>;
                $body
            }
            UnaryOp::Log => {
                let $f = scalar::log::<$T>;
                $body
            }
            UnaryOp::Sin => {
                let $f = scalar::sin::<$T>;
                $body
            }
            UnaryOp::Cos => {
                let $f = scalar::cos::<$T>;
                $body
            }
            UnaryOp::Tanh => {
                let $f = scalar::tanh::<$T>;
                $body
            }
            UnaryOp::Erf => {
                let $f = scalar::erf::<$T>;
                $body
            }
            UnaryOp::Ceil => {
                let $f = scalar::ceil::<$T>;
                $body
            }
            UnaryOp::Floor => {
                let $f = scalar::floor::<$T>;
                $body
            }
            UnaryOp::Round => {
                let $f = scalar::round::<$T>;
                $body
            }
            UnaryOp::NormCdf => {
                let $f = scalar::norm_cdf::<$T>;
                $body
            }
            UnaryOp::Abs => {
                let $f = scalar::abs::<$T>;
                $body
            }
            UnaryOp::Sqr => {
                let $f = scalar::sqr::<$T>;
                $body
            }
            UnaryOp::Sqrt => {
                let $f = scalar::sqrt::<$T>;
                $body
            }
            UnaryOp::Gelu => {
                let $f = scalar::gelu::<$T>;
                $body
            }
            UnaryOp::GeluErf => {
                let $f = scalar::gelu_erf::<$T>;
                $body
            }
            UnaryOp::Relu => {
                let $f = scalar::relu::<$T>;
                $body
            }
            UnaryOp::Elu { alpha } => {
                let $f = scalar::elu::<$T>(<$T>::from_f64(alpha));
                $body
            }
            UnaryOp::Silu => {
                let $f = scalar::silu::<$T>;
                $body
            }
            UnaryOp::Powf { exponent } => {
                let $f = scalar::powf::<$T>(<$T>::from_f64(exponent));
                $body
            }
            UnaryOp::Sign => {
                let $f = scalar::sign::<$T>;
                $body
            }
            UnaryOp::Sigmoid => {
                let $f = scalar::sigmoid::<$T>;
                $body
            }
            UnaryOp::Affine { mul, add } => {
                let $f = scalar::affine::<$T>(<$T>::from_f64(mul), <$T>::from_f64(add));
                $body
            }
        }
    }};
}

/// Element-wise unary operations.
///
/// Parameters are kept in f64 and narrowed to the element type once per call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Copy,
    Neg,
    Recip,
    Exp,
    Log,
    Sin,
    Cos,
    Tanh,
    Erf,
    Ceil,
    Floor,
    /// Half away from zero.
    Round,
    /// Standard normal CDF: 0.5 * (1 + erf(x / √2)).
    NormCdf,
    Abs,
    Sqr,
    Sqrt,
    /// GELU, tanh approximation.
    Gelu,
    /// GELU, exact (erf-based).
    GeluErf,
    Relu,
    Elu { alpha: f64 },
    Silu,
    Powf { exponent: f64 },
    Sign,
    Sigmoid,
    /// x * mul + add
    Affine { mul: f64, add: f64 },
}

impl UnaryOp {
    /// Every operation by name. Parameterized operations carry their default
    /// parameters here.
    pub const CATALOGUE: &'static [(&'static str, UnaryOp)] = &[
        ("copy", UnaryOp::Copy),
        ("neg", UnaryOp::Neg),
        ("recip", UnaryOp::Recip),
        ("exp", UnaryOp::Exp),
        ("log", UnaryOp::Log),
        ("sin", UnaryOp::Sin),
        ("cos", UnaryOp::Cos),
        ("tanh", UnaryOp::Tanh),
        ("erf", UnaryOp::Erf),
        ("ceil", UnaryOp::Ceil),
        ("floor", UnaryOp::Floor),
        ("round", UnaryOp::Round),
        ("normcdf", UnaryOp::NormCdf),
        ("abs", UnaryOp::Abs),
        ("sqr", UnaryOp::Sqr),
        ("sqrt", UnaryOp::Sqrt),
        ("gelu", UnaryOp::Gelu),
        ("gelu_erf", UnaryOp::GeluErf),
        ("relu", UnaryOp::Relu),
        ("elu", UnaryOp::Elu { alpha: 1.0 }),
        ("silu", UnaryOp::Silu),
        ("powf", UnaryOp::Powf { exponent: 2.0 }),
        ("sign", UnaryOp::Sign),
        ("sigmoid", UnaryOp::Sigmoid),
        ("affine", UnaryOp::Affine { mul: 1.0, add: 0.0 }),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Copy => "copy",
            UnaryOp::Neg => "neg",
            UnaryOp::Recip => "recip",
            UnaryOp::Exp => "exp",
            UnaryOp::Log => "log",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Erf => "erf",
            UnaryOp::Ceil => "ceil",
            UnaryOp::Floor => "floor",
            UnaryOp::Round => "round",
            UnaryOp::NormCdf => "normcdf",
            UnaryOp::Abs => "abs",
            UnaryOp::Sqr => "sqr",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Gelu => "gelu",
            UnaryOp::GeluErf => "gelu_erf",
            UnaryOp::Relu => "relu",
            UnaryOp::Elu { .. } => "elu",
            UnaryOp::Silu => "silu",
            UnaryOp::Powf { .. } => "powf",
            UnaryOp::Sign => "sign",
            UnaryOp::Sigmoid => "sigmoid",
            UnaryOp::Affine { .. } => "affine",
        }
    }

    /// Evaluate the scalar function on a single value.
    pub fn eval<T: KernelFloat>(self, x: T) -> T {
        dispatch_unary!(self, T, |f| f(x))
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Elu { alpha } => write!(f, "elu(alpha={})", alpha),
            UnaryOp::Powf { exponent } => write!(f, "powf(exponent={})", exponent),
            UnaryOp::Affine { mul, add } => write!(f, "affine(mul={}, add={})", mul, add),
            op => write!(f, "{}", op.name()),
        }
    }
}

impl FromStr for UnaryOp {
    type Err = Error;

    /// Look an operation up by catalogue name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnaryOp::CATALOGUE
            .iter()
            .find(|(name, _)| *name == s)
            .map(|&(_, op)| op)
            .ok_or_else(|| Error::msg(format!("unknown unary op '{}'", s)))
    }
}

/// Scalar functions, one per catalogue entry, generic over precision.
///
/// Everything is computed in the element type; constants are narrowed from
/// f64 once.
pub mod scalar {
    use vole_core::KernelFloat;

    #[inline]
    fn c<T: KernelFloat>(v: f64) -> T {
        T::from_f64(v)
    }

    pub fn copy<T: KernelFloat>(x: T) -> T {
        x
    }

    pub fn neg<T: KernelFloat>(x: T) -> T {
        -x
    }

    pub fn recip<T: KernelFloat>(x: T) -> T {
        T::one() / x
    }

    pub fn exp<T: KernelFloat>(x: T) -> T {
        x.exp()
    }

    pub fn log<T: KernelFloat>(x: T) -> T {
        x.ln()
    }

    pub fn sin<T: KernelFloat>(x: T) -> T {
        x.sin()
    }

    pub fn cos<T: KernelFloat>(x: T) -> T {
        x.cos()
    }

    pub fn tanh<T: KernelFloat>(x: T) -> T {
        x.tanh()
    }

    pub fn erf<T: KernelFloat>(x: T) -> T {
        KernelFloat::erf(x)
    }

    pub fn ceil<T: KernelFloat>(x: T) -> T {
        x.ceil()
    }

    pub fn floor<T: KernelFloat>(x: T) -> T {
        x.floor()
    }

    pub fn round<T: KernelFloat>(x: T) -> T {
        x.round()
    }

    pub fn norm_cdf<T: KernelFloat>(x: T) -> T {
        c::<T>(0.5) * (T::one() + KernelFloat::erf(x / c(std::f64::consts::SQRT_2)))
    }

    pub fn abs<T: KernelFloat>(x: T) -> T {
        x.abs()
    }

    pub fn sqr<T: KernelFloat>(x: T) -> T {
        x * x
    }

    pub fn sqrt<T: KernelFloat>(x: T) -> T {
        x.sqrt()
    }

    /// 0.5 * x * (1 + tanh(√(2/π) * (x + 0.044715 * x³)))
    pub fn gelu<T: KernelFloat>(x: T) -> T {
        let inner = c::<T>(0.797_884_560_802_865_4) * (x + c::<T>(0.044715) * x * x * x);
        c::<T>(0.5) * x * (T::one() + inner.tanh())
    }

    /// x * 0.5 * (1 + erf(x / √2))
    pub fn gelu_erf<T: KernelFloat>(x: T) -> T {
        x * c::<T>(0.5) * (T::one() + KernelFloat::erf(x / c(std::f64::consts::SQRT_2)))
    }

    pub fn relu<T: KernelFloat>(x: T) -> T {
        if x > T::zero() {
            x
        } else {
            T::zero()
        }
    }

    pub fn elu<T: KernelFloat>(alpha: T) -> impl Fn(T) -> T {
        move |x| {
            if x > T::zero() {
                x
            } else {
                alpha * (x.exp() - T::one())
            }
        }
    }

    pub fn sigmoid<T: KernelFloat>(x: T) -> T {
        T::one() / (T::one() + (-x).exp())
    }

    pub fn silu<T: KernelFloat>(x: T) -> T {
        x * sigmoid(x)
    }

    pub fn powf<T: KernelFloat>(exponent: T) -> impl Fn(T) -> T {
        move |x| x.powf(exponent)
    }

    /// -1, 0 or 1; NaN stays NaN.
    pub fn sign<T: KernelFloat>(x: T) -> T {
        if x < T::zero() {
            -T::one()
        } else if x > T::zero() {
            T::one()
        } else if x == T::zero() {
            T::zero()
        } else {
            x
        }
    }

    pub fn affine<T: KernelFloat>(mul: T, add: T) -> impl Fn(T) -> T {
        move |x| x * mul + add
    }
}

// Generic primitives

/// Apply `f` over the first `numel` elements of a contiguous buffer.
///
/// With `src == None` the destination is transformed in place.
pub fn map_contiguous<T, F>(numel: usize, src: Option<&[T]>, dst: &mut [T], f: F)
where
    T: Copy,
    F: Fn(T) -> T,
{
    debug_assert!(dst.len() >= numel, "destination shorter than numel");
    match src {
        Some(src) => {
            for (d, &s) in dst[..numel].iter_mut().zip(src[..numel].iter()) {
                *d = f(s);
            }
        }
        None => {
            for d in dst[..numel].iter_mut() {
                *d = f(*d);
            }
        }
    }
}

/// Apply `f` over every element of a strided view.
///
/// Out-of-place, `dst` receives `layout.elem_count()` values in row-major
/// order. In place, `dst` is addressed through the layout itself.
pub fn map_strided<T, F>(layout: &Layout, src: Option<&[T]>, dst: &mut [T], f: F)
where
    T: Copy,
    F: Fn(T) -> T,
{
    if layout.is_contiguous() {
        return map_contiguous(layout.elem_count(), src, dst, f);
    }
    match src {
        Some(src) => {
            let numel = layout.elem_count();
            debug_assert!(dst.len() >= numel, "destination shorter than numel");
            for (d, idx) in dst[..numel].iter_mut().zip(layout.strided_indices()) {
                *d = f(src[idx]);
            }
        }
        None => {
            for idx in layout.strided_indices() {
                dst[idx] = f(dst[idx]);
            }
        }
    }
}

// Kernel entry points

/// Unary kernel over contiguous memory.
pub fn unary_contiguous<T: KernelFloat>(op: UnaryOp, numel: usize, src: Option<&[T]>, dst: &mut [T]) {
    dispatch_unary!(op, T, |f| map_contiguous(numel, src, dst, f))
}

/// Unary kernel over a strided source view (or, in place, a strided
/// destination view). Contiguous layouts take the contiguous fast path.
pub fn unary_strided<T: KernelFloat>(op: UnaryOp, layout: &Layout, src: Option<&[T]>, dst: &mut [T]) {
    dispatch_unary!(op, T, |f| map_strided(layout, src, dst, f))
}
