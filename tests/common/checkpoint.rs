//! Writes checkpoints in the `torch.save` layout: a zip holding
//! `archive/data.pkl` plus one raw little-endian storage per tensor under
//! `archive/data/<key>`.

use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const PROTO: u8 = 0x80;
const MARK: u8 = b'(';
const STOP: u8 = b'.';
const TUPLE: u8 = b't';
const EMPTY_TUPLE: u8 = b')';
const EMPTY_DICT: u8 = b'}';
const EMPTY_LIST: u8 = b']';
const SETITEMS: u8 = b'u';
const APPENDS: u8 = b'e';
const BINPERSID: u8 = b'Q';
const REDUCE: u8 = b'R';
const NEWFALSE: u8 = 0x89;

/// One float32 tensor as PyTorch stores it, row-major
pub struct TorchTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

impl TorchTensor {
    pub fn filled(name: &str, shape: &[usize], value: f32) -> Self {
        Self {
            name: name.to_string(),
            shape: shape.to_vec(),
            values: vec![value; shape.iter().product()],
        }
    }

    pub fn zeros(name: &str, shape: &[usize]) -> Self {
        Self::filled(name, shape, 0.0)
    }

    /// Set one element by its multi-index
    pub fn set(&mut self, index: &[usize], value: f32) {
        let flat: usize = index
            .iter()
            .zip(strides(&self.shape))
            .map(|(i, stride)| i * stride)
            .sum();
        self.values[flat] = value;
    }
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

#[derive(Default)]
struct Pickle(Vec<u8>);

impl Pickle {
    fn op(&mut self, op: u8) -> &mut Self {
        self.0.push(op);
        self
    }

    fn global(&mut self, module: &str, name: &str) -> &mut Self {
        self.0.push(b'c');
        self.0.extend_from_slice(module.as_bytes());
        self.0.push(b'\n');
        self.0.extend_from_slice(name.as_bytes());
        self.0.push(b'\n');
        self
    }

    fn unicode(&mut self, s: &str) -> &mut Self {
        self.0.push(b'X');
        self.0.extend_from_slice(&(s.len() as u32).to_le_bytes());
        self.0.extend_from_slice(s.as_bytes());
        self
    }

    fn int(&mut self, v: usize) -> &mut Self {
        if v < 256 {
            self.0.extend_from_slice(&[b'K', v as u8]);
        } else {
            self.0.push(b'J');
            self.0.extend_from_slice(&(v as i32).to_le_bytes());
        }
        self
    }

    fn float(&mut self, v: f64) -> &mut Self {
        // Pickle floats are big-endian
        self.0.push(b'G');
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn int_tuple(&mut self, values: &[usize]) -> &mut Self {
        self.op(MARK);
        for &v in values {
            self.int(v);
        }
        self.op(TUPLE)
    }

    /// `torch._utils._rebuild_tensor_v2(storage, 0, shape, stride, False, OrderedDict())`
    fn tensor(&mut self, storage_key: &str, tensor: &TorchTensor) -> &mut Self {
        self.global("torch._utils", "_rebuild_tensor_v2").op(MARK);

        self.op(MARK)
            .unicode("storage")
            .global("torch", "FloatStorage")
            .unicode(storage_key)
            .unicode("cpu")
            .int(tensor.values.len())
            .op(TUPLE)
            .op(BINPERSID);

        self.int(0)
            .int_tuple(&tensor.shape)
            .int_tuple(&strides(&tensor.shape))
            .op(NEWFALSE)
            .global("collections", "OrderedDict")
            .op(EMPTY_TUPLE)
            .op(REDUCE);

        self.op(TUPLE).op(REDUCE)
    }
}

/// Write `{"state_dict": {...}, "optimizer": {...}}` the way a training
/// script's `torch.save` call does
pub fn write_torch_checkpoint(path: &Path, tensors: &[TorchTensor]) -> anyhow::Result<()> {
    let mut pickle = Pickle::default();
    pickle.op(PROTO).op(2).op(EMPTY_DICT).op(MARK);

    pickle.unicode("state_dict").op(EMPTY_DICT).op(MARK);
    for (idx, tensor) in tensors.iter().enumerate() {
        pickle.unicode(&tensor.name).tensor(&idx.to_string(), tensor);
    }
    pickle.op(SETITEMS);

    // SGD optimizer state; read past, never restored
    pickle
        .unicode("optimizer")
        .op(EMPTY_DICT)
        .op(MARK)
        .unicode("state")
        .op(EMPTY_DICT)
        .unicode("param_groups")
        .op(EMPTY_LIST)
        .op(MARK)
        .op(EMPTY_DICT)
        .op(MARK)
        .unicode("lr")
        .float(0.001)
        .unicode("momentum")
        .float(0.9)
        .unicode("params")
        .op(EMPTY_LIST)
        .op(MARK);
    for idx in 0..tensors.len() {
        pickle.int(idx);
    }
    pickle.op(APPENDS).op(SETITEMS).op(APPENDS).op(SETITEMS);

    pickle.op(SETITEMS).op(STOP);

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(std::fs::File::create(path)?);

    zip.start_file("archive/data.pkl", options)?;
    zip.write_all(&pickle.0)?;

    for (idx, tensor) in tensors.iter().enumerate() {
        zip.start_file(format!("archive/data/{idx}"), options)?;
        for value in &tensor.values {
            zip.write_all(&value.to_le_bytes())?;
        }
    }

    zip.start_file("archive/version", options)?;
    zip.write_all(b"3\n")?;
    zip.finish()?;

    Ok(())
}

/// Weights whose answer is known for any input: conv biases of one push a
/// constant 576-vector of ones into fc1, hidden unit 3 averages it to 1.0,
/// and fc2 maps that to 2.0 on class 7 over a bias of 1.0 on class 4.
///
/// Linear weights are stored `[out, in]` as PyTorch keeps them.
pub fn known_answer_weights() -> Vec<TorchTensor> {
    let mut fc1 = TorchTensor::zeros("fc1.weight", &[128, 576]);
    for j in 0..576 {
        fc1.set(&[3, j], 1.0 / 576.0);
    }

    let mut fc2 = TorchTensor::zeros("fc2.weight", &[11, 128]);
    fc2.set(&[7, 3], 2.0);

    let mut fc2_bias = TorchTensor::zeros("fc2.bias", &[11]);
    fc2_bias.set(&[4], 1.0);

    vec![
        TorchTensor::zeros("conv1.weight", &[8, 3, 3, 3]),
        TorchTensor::filled("conv1.bias", &[8], 1.0),
        TorchTensor::zeros("conv2.weight", &[16, 8, 3, 3]),
        TorchTensor::filled("conv2.bias", &[16], 1.0),
        fc1,
        TorchTensor::zeros("fc1.bias", &[128]),
        fc2,
        fc2_bias,
    ]
}
