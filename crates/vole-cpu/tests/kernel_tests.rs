// Integration tests for the vole CPU kernels
//
// These exercise the public kernel API the way a tensor layer would call it:
// flat buffers plus shape/stride descriptions, both precisions, contiguous
// and strided sources, in-place and out-of-place.

use vole_core::{KernelFloat, Layout, WithDType};
use vole_cpu::storage::{self, CpuStorage};
use vole_cpu::{
    arg_sort_contiguous, arg_sort_strided, sorted_values, unary_contiguous, unary_strided,
    SortOrder, UnaryOp,
};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

fn assert_vec_approx(got: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(
        got.len(),
        expected.len(),
        "length mismatch: {} vs {}",
        got.len(),
        expected.len()
    );
    for (i, (g, e)) in got.iter().zip(expected.iter()).enumerate() {
        assert!(
            approx_eq(*g, *e, tol),
            "index {}: got {} expected {} (tol {})",
            i,
            g,
            e,
            tol
        );
    }
}

fn erf(x: f64) -> f64 {
    libm::erf(x)
}

type Case = (UnaryOp, fn(f64) -> f64, Vec<f64>);

fn case(op: UnaryOp, f: fn(f64) -> f64, xs: &[f64]) -> Case {
    (op, f, xs.to_vec())
}

/// Reference formulas in f64, each with inputs inside its domain.
fn reference_table() -> Vec<Case> {
    let general = [-1.0, -0.75, -0.5, -0.25, 0.0, 0.25, 0.5, 0.75, 1.0];
    let positive = [0.25, 0.5, 1.0, 1.5, 2.0];
    let nonzero = [-2.0, -0.5, 0.5, 1.0, 2.0];
    let halves = [-2.5, -1.5, -0.5, 0.5, 1.5, 2.5, -1.2, 1.7];
    vec![
        case(UnaryOp::Copy, |x| x, &general),
        case(UnaryOp::Neg, |x| -x, &general),
        case(UnaryOp::Recip, |x| 1.0 / x, &nonzero),
        case(UnaryOp::Exp, |x| x.exp(), &general),
        case(UnaryOp::Log, |x| x.ln(), &positive),
        case(UnaryOp::Sin, |x| x.sin(), &general),
        case(UnaryOp::Cos, |x| x.cos(), &general),
        case(UnaryOp::Tanh, |x| x.tanh(), &general),
        case(UnaryOp::Erf, erf, &general),
        case(UnaryOp::Ceil, |x| x.ceil(), &halves),
        case(UnaryOp::Floor, |x| x.floor(), &halves),
        case(UnaryOp::Round, |x| x.round(), &halves),
        case(
            UnaryOp::NormCdf,
            |x| 0.5 * (1.0 + erf(x / 2f64.sqrt())),
            &general,
        ),
        case(UnaryOp::Abs, |x| x.abs(), &general),
        case(UnaryOp::Sqr, |x| x * x, &general),
        case(UnaryOp::Sqrt, |x| x.sqrt(), &positive),
        case(
            UnaryOp::Gelu,
            |x| {
                let k = (2.0 / std::f64::consts::PI).sqrt();
                0.5 * x * (1.0 + (k * (x + 0.044715 * x * x * x)).tanh())
            },
            &general,
        ),
        case(
            UnaryOp::GeluErf,
            |x| x * 0.5 * (1.0 + erf(x / 2f64.sqrt())),
            &general,
        ),
        case(UnaryOp::Relu, |x| x.max(0.0), &general),
        case(
            UnaryOp::Elu { alpha: 0.5 },
            |x| if x > 0.0 { x } else { 0.5 * (x.exp() - 1.0) },
            &general,
        ),
        case(UnaryOp::Silu, |x| x * (1.0 / (1.0 + (-x).exp())), &general),
        case(UnaryOp::Powf { exponent: 1.5 }, |x| x.powf(1.5), &positive),
        case(
            UnaryOp::Sign,
            |x| {
                if x < 0.0 {
                    -1.0
                } else if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            },
            &general,
        ),
        case(UnaryOp::Sigmoid, |x| 1.0 / (1.0 + (-x).exp()), &general),
        case(
            UnaryOp::Affine { mul: -2.0, add: 0.25 },
            |x| x * -2.0 + 0.25,
            &general,
        ),
    ]
}

fn run_contiguous<T: KernelFloat>(op: UnaryOp, xs: &[f64]) -> Vec<f64> {
    let src: Vec<T> = xs.iter().map(|&x| T::from_f64(x)).collect();
    let mut dst = vec![T::from_f64(0.0); src.len()];
    unary_contiguous(op, src.len(), Some(&src[..]), &mut dst);
    dst.into_iter().map(WithDType::to_f64).collect()
}

// Formula checks

#[test]
fn test_every_op_matches_formula_f64() {
    let table = reference_table();
    assert_eq!(table.len(), UnaryOp::CATALOGUE.len());
    for (op, f, xs) in table {
        let want: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let got = run_contiguous::<f64>(op, &xs);
        for (i, (g, w)) in got.iter().zip(want.iter()).enumerate() {
            assert!(approx_eq(*g, *w, 1e-6), "{} at {}: got {} want {}", op, xs[i], g, w);
        }
    }
}

#[test]
fn test_every_op_matches_formula_f32() {
    for (op, f, xs) in reference_table() {
        let want: Vec<f64> = xs.iter().map(|&x| f(x)).collect();
        let got = run_contiguous::<f32>(op, &xs);
        for (i, (g, w)) in got.iter().zip(want.iter()).enumerate() {
            assert!(approx_eq(*g, *w, 1e-6), "{} at {}: got {} want {}", op, xs[i], g, w);
        }
    }
}

#[test]
fn test_gelu_exact_at_minus_one() {
    let want = -1.0 * 0.5 * (1.0 + erf(-1.0 / 2f64.sqrt()));
    assert_vec_approx(&run_contiguous::<f64>(UnaryOp::GeluErf, &[-1.0]), &[want], 1e-6);
    assert_vec_approx(&run_contiguous::<f32>(UnaryOp::GeluErf, &[-1.0]), &[want], 1e-6);
}

#[test]
fn test_gelu_tanh_known_points() {
    // x = ±1, 0: the values the cubic coefficient cannot be told apart at.
    let got = run_contiguous::<f64>(UnaryOp::Gelu, &[-1.0, 0.0, 1.0]);
    assert_vec_approx(&got, &[-0.158_808, 0.0, 0.841_192], 1e-6);
}

// Transform laws

#[test]
fn test_apply_twice_matches_composition() {
    let xs = [0.1f64, 0.7, 1.3, 2.0];
    for op in [UnaryOp::Sqrt, UnaryOp::Tanh, UnaryOp::Sigmoid, UnaryOp::Neg] {
        let mut once = [0.0f64; 4];
        let mut twice = [0.0f64; 4];
        unary_contiguous(op, 4, Some(&xs[..]), &mut once);
        unary_contiguous(op, 4, Some(&once[..]), &mut twice);
        for (i, &x) in xs.iter().enumerate() {
            assert_eq!(twice[i], op.eval(op.eval(x)));
        }
    }
}

#[test]
fn test_in_place_matches_out_of_place() {
    let xs = vec![-1.5f32, -0.2, 0.0, 0.4, 3.0];
    for &(_, op) in UnaryOp::CATALOGUE {
        let mut out = vec![0.0f32; xs.len()];
        unary_contiguous(op, xs.len(), Some(&xs[..]), &mut out);
        let mut inplace = xs.clone();
        unary_contiguous(op, xs.len(), None, &mut inplace);
        for (a, b) in out.iter().zip(inplace.iter()) {
            assert!(a == b || (a.is_nan() && b.is_nan()), "{}: {} vs {}", op, a, b);
        }
    }
}

#[test]
fn test_strided_contiguous_layout_equals_contiguous_path() {
    let xs: Vec<f64> = (0..12).map(|i| i as f64 * 0.25 - 1.0).collect();
    let layout = Layout::from_parts(3, &[2, 3, 2], &[6, 2, 1]).unwrap();
    let mut a = vec![0.0; 12];
    let mut b = vec![0.0; 12];
    unary_contiguous(UnaryOp::Silu, 12, Some(&xs[..]), &mut a);
    unary_strided(UnaryOp::Silu, &layout, Some(&xs[..]), &mut b);
    assert_eq!(a, b);
}

#[test]
fn test_strided_broadcast_source() {
    // A row of 3 broadcast to [2, 3] through a zero stride
    let xs = [1.0f32, 4.0, 9.0];
    let layout = Layout::contiguous(3usize).broadcast_as((2, 3)).unwrap();
    let mut dst = [0.0f32; 6];
    unary_strided(UnaryOp::Sqrt, &layout, Some(&xs[..]), &mut dst);
    assert_eq!(dst, [1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
}

#[test]
fn test_strided_reversed_source() {
    let xs = [1.0f64, 2.0, 3.0, 4.0];
    let layout = Layout::new(4usize, vec![-1], 3).unwrap();
    let mut dst = [0.0f64; 4];
    unary_strided(UnaryOp::Powf { exponent: 2.0 }, &layout, Some(&xs[..]), &mut dst);
    assert_eq!(dst, [16.0, 9.0, 4.0, 1.0]);
}

#[test]
fn test_zero_length_leaves_destination_untouched() {
    let empty: [f64; 0] = [];
    let mut dst = [7.0f64; 3];
    for &(_, op) in UnaryOp::CATALOGUE {
        unary_contiguous(op, 0, Some(&empty[..]), &mut dst);
        unary_contiguous(op, 0, None, &mut dst);
        unary_strided(op, &Layout::contiguous(()), Some(&empty[..]), &mut dst);
        unary_strided(op, &Layout::contiguous((2, 0)), None, &mut dst);
    }
    assert_eq!(dst, [7.0; 3]);
}

// Argsort scenarios

#[test]
fn test_arg_sort_asc_single_row() {
    let src = [3.0f32, 1.0, 2.0];
    let mut dst = [0.0f32; 3];
    let idx = arg_sort_contiguous(SortOrder::Asc, 3, &src, &mut dst);
    assert_eq!(idx, vec![1, 2, 0]);
    assert_eq!(dst.iter().map(|&v| v as u32).collect::<Vec<_>>(), vec![1, 2, 0]);
}

#[test]
fn test_arg_sort_desc_transposed_view() {
    let layout = Layout::from_parts(2, &[2, 2], &[1, 2]).unwrap();
    let src = [4.0f64, 2.0, 1.0, 3.0];
    let mut dst = [0.0f64; 4];
    let idx = arg_sort_strided(SortOrder::Desc, 2, &layout, &src, &mut dst);
    assert_eq!(idx, vec![0, 1, 1, 0]);
    assert_eq!(dst.iter().map(|&v| v as u32).collect::<Vec<_>>(), idx);
}

#[test]
fn test_arg_sort_strided_3d_narrowed() {
    // [2, 2, 4] buffer, take columns 1..4 of the innermost dim
    let buf: Vec<f32> = vec![
        9.0, 3.0, 1.0, 2.0, //
        9.0, 5.0, 5.0, 4.0, //
        9.0, 0.0, 8.0, 7.0, //
        9.0, 6.0, 6.0, 6.0,
    ];
    let layout = Layout::contiguous((2, 2, 4)).narrow(2, 1, 3).unwrap();
    let mut dst = vec![0.0f32; 12];
    let idx = arg_sort_strided(SortOrder::Asc, 3, &layout, &buf, &mut dst);
    assert_eq!(idx, vec![1, 2, 0, 2, 0, 1, 0, 2, 1, 0, 1, 2]);
}

#[test]
fn test_arg_sort_empty() {
    let mut dst = [5.0f64; 2];
    let idx = arg_sort_contiguous::<f64>(SortOrder::Asc, 0, &[], &mut dst);
    assert!(idx.is_empty());
    assert_eq!(dst, [5.0, 5.0]);
}

#[test]
fn test_sorted_values_are_separate_from_dst() {
    let src = [0.5f64, -1.0, 2.0, 2.0, 0.0, 1.0];
    let mut dst = [0.0f64; 6];
    let idx = arg_sort_contiguous(SortOrder::Desc, 3, &src, &mut dst);
    assert_eq!(dst, [2.0, 0.0, 1.0, 0.0, 2.0, 1.0]);
    assert_eq!(sorted_values(3, &src, &idx), vec![2.0, 0.5, -1.0, 2.0, 1.0, 0.0]);
}

// Checked dispatch

#[test]
fn test_storage_round_trip_through_views() -> vole_core::Result<()> {
    let input = CpuStorage::from(vec![1.0f32, -2.0, 3.0, -4.0, 5.0, -6.0]);
    let layout = Layout::contiguous((2, 3)).transpose(0, 1)?;
    let abs = storage::unary_op(UnaryOp::Abs, &input, &layout)?;
    assert_vec_approx(&abs.to_f64_vec(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0], 1e-12);

    let (perm, idx) = storage::arg_sort(SortOrder::Asc, &input, &layout)?;
    assert_eq!(idx, vec![1, 0, 0, 1, 1, 0]);
    assert_vec_approx(&perm.to_f64_vec(), &[1.0, 0.0, 0.0, 1.0, 1.0, 0.0], 1e-12);
    Ok(())
}
