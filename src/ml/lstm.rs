// ============================================================
// Layer 5 — LSTM Cell and Stacked Recurrence
// ============================================================
// LstmCell — one gated step:
//   [i, j, f, o] = W · [x ; h] + b
//   c' = σ(f + forget_bias) ⊙ c + σ(i) ⊙ tanh(j)
//   h' = σ(o) ⊙ tanh(c')
//
// LstmStack — num_layers cells applied bottom-up at every
//   time step. With skip connections each layer after the
//   first adds its input to its output (residual), so every
//   layer emits hidden_dim features.
//
// unroll() walks the time axis with length masking:
//   t <  length → state advances, output = top-layer output
//   t >= length → state is carried unchanged, output = 0
//
// Direction::Backward walks T-1 down to 0. Because padded
// steps leave the zero state untouched, each row effectively
// starts at its own last valid token, which matches reversing
// every row up to its length, running forward, and reversing
// the outputs back.
//
// Reference: Hochreiter & Schmidhuber (1997) Long Short-Term Memory
//            Zaremba et al. (2014) Recurrent Neural Network Regularization

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::{sigmoid, tanh},
};

use crate::domain::{error::{self, Seq2SeqError}, sequence::validate_lengths};
use crate::ml::masking::length_mask;

// ─── LstmState ────────────────────────────────────────────────────────────────
/// (hidden, cell) pair for one layer, each `[batch, hidden_dim]`.
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    pub cell:   Tensor<B, 2>,
}

impl<B: Backend> LstmState<B> {
    pub fn zeros(batch_size: usize, hidden_dim: usize, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([batch_size, hidden_dim], device),
            cell:   Tensor::zeros([batch_size, hidden_dim], device),
        }
    }

    /// Rows where `mask` is 1 take `self`, rows where it is 0 keep `previous`.
    /// mask: [batch, 1]
    pub fn masked(self, previous: Self, mask: Tensor<B, 2>) -> Self {
        Self {
            hidden: blend(self.hidden, previous.hidden, mask.clone()),
            cell:   blend(self.cell, previous.cell, mask),
        }
    }
}

fn blend<B: Backend>(next: Tensor<B, 2>, previous: Tensor<B, 2>, mask: Tensor<B, 2>) -> Tensor<B, 2> {
    let shape = next.dims();
    let keep  = mask.clone().mul_scalar(-1.0).add_scalar(1.0).expand(shape);
    next * mask.expand(shape) + previous * keep
}

// ─── LstmCell ─────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct LstmCellConfig {
    pub d_input:  usize,
    pub d_hidden: usize,
    /// Added to the forget gate pre-activation so fresh cells remember by default
    #[config(default = 1.0)]
    pub forget_bias: f64,
}

impl LstmCellConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<LstmCell<B>> {
        if self.d_input == 0 || self.d_hidden == 0 {
            return Err(Seq2SeqError::InvalidConfig(format!(
                "lstm cell needs d_input > 0 and d_hidden > 0 (got {} and {})",
                self.d_input, self.d_hidden
            )));
        }
        let gates = LinearConfig::new(self.d_input + self.d_hidden, 4 * self.d_hidden).init(device);
        Ok(LstmCell {
            gates,
            d_input:     self.d_input,
            d_hidden:    self.d_hidden,
            forget_bias: self.forget_bias,
        })
    }
}

#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    pub gates:       Linear<B>,
    pub d_input:     usize,
    pub d_hidden:    usize,
    pub forget_bias: f64,
}

impl<B: Backend> LstmCell<B> {
    /// One recurrent step. input: [batch, d_input]
    pub fn step(&self, input: Tensor<B, 2>, state: &LstmState<B>) -> LstmState<B> {
        let [batch_size, _] = input.dims();
        let h = self.d_hidden;

        let gates = self.gates.forward(Tensor::cat(vec![input, state.hidden.clone()], 1));
        let gate  = |k: usize| gates.clone().slice([0..batch_size, k * h..(k + 1) * h]);

        let input_gate  = sigmoid(gate(0));
        let candidate   = tanh(gate(1));
        let forget_gate = sigmoid(gate(2).add_scalar(self.forget_bias));
        let output_gate = sigmoid(gate(3));

        let cell   = forget_gate * state.cell.clone() + input_gate * candidate;
        let hidden = output_gate * tanh(cell.clone());

        LstmState { hidden, cell }
    }
}

// ─── LstmStack ────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct LstmStackConfig {
    pub d_input:  usize,
    pub d_hidden: usize,
    #[config(default = 1)]
    pub num_layers: usize,
    #[config(default = false)]
    pub skip_connections: bool,
    #[config(default = 1.0)]
    pub forget_bias: f64,
}

impl LstmStackConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<LstmStack<B>> {
        if self.num_layers == 0 {
            return Err(Seq2SeqError::InvalidConfig(
                "lstm stack needs at least one layer".to_string(),
            ));
        }

        let layers = (0..self.num_layers)
            .map(|i| {
                let d_input = if i == 0 { self.d_input } else { self.d_hidden };
                LstmCellConfig::new(d_input, self.d_hidden)
                    .with_forget_bias(self.forget_bias)
                    .init(device)
            })
            .collect::<error::Result<Vec<_>>>()?;

        tracing::debug!(
            "Built LSTM stack: {} layers, d_input={}, d_hidden={}, skip={}",
            self.num_layers, self.d_input, self.d_hidden, self.skip_connections
        );

        Ok(LstmStack {
            layers,
            d_input:          self.d_input,
            d_hidden:         self.d_hidden,
            skip_connections: self.skip_connections,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Per-step top-layer outputs plus every layer's final state.
#[derive(Debug, Clone)]
pub struct RecurrentOutput<B: Backend> {
    /// [batch, time, d_hidden], zero at padded steps
    pub outputs:      Tensor<B, 3>,
    /// One state per layer, bottom first
    pub final_states: Vec<LstmState<B>>,
}

impl<B: Backend> RecurrentOutput<B> {
    /// Hidden component of the last layer's final state.
    ///
    /// The state is read as (hidden, cell) with hidden first; only the
    /// hidden half is used as the sequence summary.
    pub fn final_hidden(&self) -> Option<Tensor<B, 2>> {
        self.final_states.last().map(|state| state.hidden.clone())
    }
}

#[derive(Module, Debug)]
pub struct LstmStack<B: Backend> {
    pub layers:           Vec<LstmCell<B>>,
    pub d_input:          usize,
    pub d_hidden:         usize,
    pub skip_connections: bool,
}

impl<B: Backend> LstmStack<B> {
    /// Zero state for every layer, sized by the batch seen at call time.
    pub fn initial_state(&self, batch_size: usize, device: &B::Device) -> Vec<LstmState<B>> {
        self.layers
            .iter()
            .map(|_| LstmState::zeros(batch_size, self.d_hidden, device))
            .collect()
    }

    /// One time step through every layer.
    /// Returns the top layer's output and the new per-layer states.
    pub fn step(
        &self,
        input:  Tensor<B, 2>,
        states: &[LstmState<B>],
    ) -> (Tensor<B, 2>, Vec<LstmState<B>>) {
        let mut x          = input;
        let mut new_states = Vec::with_capacity(self.layers.len());

        for (depth, (layer, state)) in self.layers.iter().zip(states).enumerate() {
            let next = layer.step(x.clone(), state);
            x = if self.skip_connections && depth > 0 {
                next.hidden.clone() + x
            } else {
                next.hidden.clone()
            };
            new_states.push(next);
        }

        (x, new_states)
    }

    /// Run the stack over `inputs: [batch, time, d_input]` honouring `lengths`.
    pub fn unroll(
        &self,
        inputs:    Tensor<B, 3>,
        lengths:   &[usize],
        direction: Direction,
    ) -> error::Result<RecurrentOutput<B>> {
        let [batch_size, max_time, d_input] = inputs.dims();
        validate_lengths(lengths, batch_size, max_time)?;
        if d_input != self.d_input {
            return Err(Seq2SeqError::ShapeMismatch {
                what:     "recurrent input features",
                expected: vec![self.d_input],
                actual:   vec![d_input],
            });
        }

        let device = inputs.device();
        let mask   = length_mask::<B>(lengths, max_time, &device);
        let mut states  = self.initial_state(batch_size, &device);
        let mut outputs = Vec::with_capacity(max_time);

        let steps: Vec<usize> = match direction {
            Direction::Forward  => (0..max_time).collect(),
            Direction::Backward => (0..max_time).rev().collect(),
        };

        for t in steps {
            let x_t    = inputs.clone().slice([0..batch_size, t..t + 1, 0..d_input]).reshape([batch_size, d_input]);
            let mask_t = mask.clone().slice([0..batch_size, t..t + 1]);

            let (output, next) = self.step(x_t, &states);

            states = next
                .into_iter()
                .zip(states)
                .map(|(next, previous)| next.masked(previous, mask_t.clone()))
                .collect();
            outputs.push(output * mask_t.expand([batch_size, self.d_hidden]));
        }

        if direction == Direction::Backward {
            outputs.reverse();
        }

        Ok(RecurrentOutput {
            outputs:      Tensor::stack(outputs, 1),
            final_states: states,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn values<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    fn stack(num_layers: usize, skip: bool) -> LstmStack<TestBackend> {
        LstmStackConfig::new(3, 5)
            .with_num_layers(num_layers)
            .with_skip_connections(skip)
            .init(&Default::default())
            .unwrap()
    }

    fn inputs(batch: usize, time: usize) -> Tensor<TestBackend, 3> {
        let n = batch * time * 3;
        let flat: Vec<f32> = (0..n).map(|i| ((i % 7) as f32 - 3.0) * 0.25).collect();
        Tensor::<TestBackend, 1>::from_floats(flat.as_slice(), &Default::default()).reshape([batch, time, 3])
    }

    #[test]
    fn test_cell_step_shapes_and_bounds() {
        let device = Default::default();
        let cell   = LstmCellConfig::new(3, 4).init::<TestBackend>(&device).unwrap();
        let state  = LstmState::zeros(2, 4, &device);
        let x      = Tensor::<TestBackend, 2>::ones([2, 3], &device);

        let next = cell.step(x, &state);
        assert_eq!(next.hidden.dims(), [2, 4]);
        assert_eq!(next.cell.dims(), [2, 4]);
        // h = σ(o)·tanh(c) is bounded by 1 in magnitude
        assert!(values(next.hidden).iter().all(|v| v.abs() < 1.0));
    }

    #[test]
    fn test_unroll_output_shape_uses_runtime_batch() {
        let s = stack(2, false);
        for batch in [1, 3] {
            let out = s.unroll(inputs(batch, 4), &vec![4; batch], Direction::Forward).unwrap();
            assert_eq!(out.outputs.dims(), [batch, 4, 5]);
            assert_eq!(out.final_states.len(), 2);
        }
    }

    #[test]
    fn test_padded_steps_emit_zero_and_freeze_state() {
        let s   = stack(1, false);
        let out = s.unroll(inputs(2, 4), &[2, 4], Direction::Forward).unwrap();
        let v   = values(out.outputs.clone());

        // row 0, steps 2 and 3 are padding
        let row0_pad = &v[2 * 5..4 * 5];
        assert!(row0_pad.iter().all(|&x| x == 0.0));

        // row 0's final hidden equals its output at the last valid step (t = 1)
        let row0_t1 = &v[5..10];
        let finals  = values(out.final_hidden().unwrap());
        assert_eq!(&finals[0..5], row0_t1);
    }

    #[test]
    fn test_padding_content_does_not_change_valid_outputs() {
        let s = stack(2, true);
        let device = Default::default();

        let a = inputs(1, 4);
        // same first two steps, different padding
        let b = Tensor::cat(
            vec![
                a.clone().slice([0..1, 0..2, 0..3]),
                Tensor::<TestBackend, 3>::ones([1, 2, 3], &device).mul_scalar(9.0),
            ],
            1,
        );

        for direction in [Direction::Forward, Direction::Backward] {
            let out_a = s.unroll(a.clone(), &[2], direction).unwrap();
            let out_b = s.unroll(b.clone(), &[2], direction).unwrap();
            assert_eq!(values(out_a.outputs), values(out_b.outputs));
        }
    }

    #[test]
    fn test_backward_matches_forward_on_reversed_rows() {
        let s = stack(1, false);
        let x = inputs(1, 3);

        let reversed = Tensor::cat(
            vec![
                x.clone().slice([0..1, 2..3, 0..3]),
                x.clone().slice([0..1, 1..2, 0..3]),
                x.clone().slice([0..1, 0..1, 0..3]),
            ],
            1,
        );

        let backward = s.unroll(x, &[3], Direction::Backward).unwrap();
        let forward  = s.unroll(reversed, &[3], Direction::Forward).unwrap();

        let b = values(backward.outputs);
        let f = values(forward.outputs);
        // backward output at t equals forward-on-reversed output at T-1-t
        for t in 0..3 {
            let bt = &b[t * 5..(t + 1) * 5];
            let ft = &f[(2 - t) * 5..(3 - t) * 5];
            for (x, y) in bt.iter().zip(ft) {
                assert!((x - y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_skip_connection_adds_layer_input_to_output() {
        let device = Default::default();
        let s      = stack(2, true);

        let (top, states) = s.step(inputs(2, 1).reshape([2, 3]), &s.initial_state(2, &device));
        let expected = states[1].hidden.clone() + states[0].hidden.clone();

        for (a, b) in values(top).iter().zip(values(expected)) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_without_skip_top_output_is_last_hidden() {
        let device = Default::default();
        let s      = stack(2, false);
        let (top, states) = s.step(inputs(2, 1).reshape([2, 3]), &s.initial_state(2, &device));
        assert_eq!(values(top), values(states[1].hidden.clone()));
    }

    #[test]
    fn test_unroll_rejects_bad_lengths() {
        let s = stack(1, false);
        assert!(matches!(
            s.unroll(inputs(2, 3), &[3, 0], Direction::Forward),
            Err(Seq2SeqError::EmptySequence { index: 1 })
        ));
        assert!(matches!(
            s.unroll(inputs(1, 3), &[4], Direction::Forward),
            Err(Seq2SeqError::LengthOutOfRange { .. })
        ));
    }

    #[test]
    fn test_zero_layers_is_a_config_error() {
        let err = LstmStackConfig::new(3, 5)
            .with_num_layers(0)
            .init::<TestBackend>(&Default::default())
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
