//! Tests for the tensor data model

use super::*;
use crate::autograd::Engine;
use crate::error::Error;
use proptest::prelude::*;

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_buffer_set_get_float() {
        let mut buf = TensorBuffer::new(&[2, 3], DType::Float32);
        buf.set(5.0f32, &[1, 2]).unwrap();
        assert_eq!(buf.get(&[1, 2]).unwrap(), Value::Float(5.0));
        assert_eq!(buf.get(&[0, 0]).unwrap(), Value::Float(0.0));
        assert_eq!(buf.values().as_f32().unwrap()[5], 5.0);
    }

    #[test]
    fn test_buffer_int_truncates() {
        let mut buf = TensorBuffer::new(&[2], DType::Int32);
        buf.set(1.3f32, &[0]).unwrap();
        buf.set(-2.7f32, &[1]).unwrap();
        assert_eq!(buf.values().as_i32(), Some(&[1, -2][..]));
    }

    #[test]
    fn test_buffer_bool() {
        let mut buf = TensorBuffer::new(&[3], DType::Bool);
        buf.set(true, &[0]).unwrap();
        buf.set(2i32, &[2]).unwrap();
        assert_eq!(buf.values().as_bool(), Some(&[1, 0, 1][..]));
        assert_eq!(buf.get(&[1]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_buffer_strings_unset_read_as_none() {
        let mut buf = TensorBuffer::new(&[2], DType::String);
        buf.set("hello", &[1]).unwrap();
        assert_eq!(buf.get(&[0]).unwrap(), Value::Str(None));
        assert_eq!(buf.get(&[1]).unwrap().as_str(), Some("hello"));
    }

    #[test]
    fn test_buffer_string_rejects_numbers() {
        let mut buf = TensorBuffer::new(&[1], DType::String);
        assert!(buf.set(1.0f32, &[0]).is_err());

        let mut buf = TensorBuffer::new(&[1], DType::Float32);
        assert!(buf.set("x", &[0]).is_err());
    }

    #[test]
    fn test_buffer_out_of_range() {
        let mut buf = TensorBuffer::new(&[2, 2, 2], DType::Float32);
        let err = buf.set(1.0f32, &[0, 0, 2]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requested out of range element at [0,0,2]. Buffer shape=[2,2,2]"
        );
        assert!(matches!(buf.get(&[2, 0, 0]), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_buffer_coordinate_count() {
        let buf = TensorBuffer::new(&[2, 2], DType::Float32);
        let err = buf.get(&[1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The number of provided coordinates (1) must match the rank (2)"
        );
        assert!(buf.loc_to_index(&[0, 0, 0]).is_err());
    }

    #[test]
    fn test_loc_index_examples() {
        let buf = TensorBuffer::new(&[2, 3, 4], DType::Float32);
        assert_eq!(buf.strides(), &[12, 4, 1]);
        assert_eq!(buf.loc_to_index(&[1, 2, 3]).unwrap(), 23);
        assert_eq!(buf.index_to_loc(23).unwrap(), vec![1, 2, 3]);
        assert!(buf.index_to_loc(24).is_err());
    }

    #[test]
    fn test_scalar_buffer() {
        let mut buf = TensorBuffer::new(&[], DType::Float32);
        assert_eq!(buf.size(), 1);
        assert_eq!(buf.rank(), 0);
        buf.set(3.5f32, &[]).unwrap();
        assert_eq!(buf.get(&[]).unwrap(), Value::Float(3.5));
        assert!(buf.index_to_loc(0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_extent_buffer_has_no_locations() {
        let flat = TensorBuffer::new(&[0], DType::Float32);
        assert_eq!(flat.size(), 0);
        assert!(matches!(flat.index_to_loc(0), Err(Error::IndexOutOfRange { .. })));

        let rows = TensorBuffer::new(&[2, 0], DType::Int32);
        assert_eq!(rows.strides(), &[0, 1]);
        assert!(matches!(rows.index_to_loc(0), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_new_string_buffer_cells_are_unset() {
        let buf = TensorBuffer::new(&[2], DType::String);
        assert_eq!(buf.values().as_strings(), Some(&[None, None][..]));
    }

    #[test]
    fn test_buffer_from_literal_rejects_fractional() {
        let err = TensorBuffer::from_shape_literal(&[2.0, 2.5], DType::Float32).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Tensor must have a shape comprised of positive integers but got shape [2,2.5]."
        );
        assert!(TensorBuffer::from_shape_literal(&[2.0, -1.0], DType::Int32).is_err());
    }

    #[test]
    fn test_buffer_from_values_size_mismatch() {
        let err = TensorBuffer::from_values(&[2, 2], TensorData::Float32(vec![1.0])).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_buffer_to_tensor() {
        let mut engine = Engine::new();
        let mut buf = TensorBuffer::new(&[2, 2], DType::Int32);
        buf.set(7i32, &[1, 0]).unwrap();
        let t = buf.to_tensor(&mut engine).unwrap();

        assert_eq!(t.shape(), &[2, 2]);
        assert_eq!(t.strides(), &[2, 1]);
        assert_eq!(t.dtype(), DType::Int32);
        assert_eq!(t.size(), 4);
        assert_eq!(engine.read_sync(&t).unwrap().as_i32(), Some(&[0, 0, 7, 0][..]));

        // The tensor owns a copy; later writes do not leak through.
        buf.set(9i32, &[0, 0]).unwrap();
        assert_eq!(engine.read_sync(&t).unwrap().as_i32(), Some(&[0, 0, 7, 0][..]));
    }

    #[test]
    fn test_engine_buffer_round_trip() {
        let mut engine = Engine::new();
        let t = crate::ops::tensor_f32(&mut engine, &[1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let buf = engine.buffer(&t).unwrap();
        assert_eq!(buf.get(&[1, 1]).unwrap(), Value::Float(4.0));
    }

    #[test]
    fn test_complex_storage() {
        let mut data = TensorData::zeros(DType::Complex64, 2);
        assert_eq!(data.len(), 2);
        assert_eq!(data.byte_size(), 16);
        data.set(1, Value::Complex(1.0, -1.0)).unwrap();
        assert_eq!(data.get(1), Some(Value::Complex(1.0, -1.0)));
    }

    #[test]
    fn test_gather_requires_one_dtype() {
        let a = TensorData::Float32(vec![1.0]);
        let b = TensorData::Int32(vec![1]);
        assert!(matches!(
            TensorData::gather_from(&[&a, &b], &[(0, 0)]),
            Err(Error::DtypeMismatch { .. })
        ));
        let picked = TensorData::gather_from(&[&a], &[(0, 0), (0, 0)]).unwrap();
        assert_eq!(picked, TensorData::Float32(vec![1.0, 1.0]));
    }

    #[test]
    fn test_value_truthiness() {
        assert!(Value::Float(0.5).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Str(None).is_truthy());
        assert!(Value::from("a").is_truthy());
        assert_eq!(Value::Bool(true).as_f32(), Some(1.0));
        assert_eq!(Value::Str(None).as_f32(), None);
    }

    #[test]
    fn test_dtype_names() {
        assert_eq!(DType::Float32.to_string(), "float32");
        assert_eq!(DType::Complex64.bytes_per_element(), 8);
        assert!(!DType::String.is_numeric());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_loc_index_round_trip(
        shape in prop::collection::vec(1usize..5, 0..4),
        seed in any::<usize>()
    ) {
        let buf = TensorBuffer::new(&shape, DType::Float32);
        let index = seed % buf.size();
        let loc = buf.index_to_loc(index).unwrap();
        prop_assert_eq!(buf.loc_to_index(&loc).unwrap(), index);
        prop_assert!(loc.iter().zip(&shape).all(|(l, d)| l < d));
    }

    #[test]
    fn prop_set_then_get(
        shape in prop::collection::vec(1usize..4, 1..4),
        value in -1e6f32..1e6
    ) {
        let mut buf = TensorBuffer::new(&shape, DType::Float32);
        let last: Vec<usize> = shape.iter().map(|d| d - 1).collect();
        buf.set(value, &last).unwrap();
        prop_assert_eq!(buf.get(&last).unwrap(), Value::Float(value));
        prop_assert_eq!(buf.loc_to_index(&last).unwrap(), buf.size() - 1);
    }
}
