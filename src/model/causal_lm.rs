//! Reference causal language model
//!
//! A residual stack of the checkpoint's square projections between the
//! token embedding `E` and the LM head `U` (the embedding itself when tied):
//!
//! ```text
//! h₀ = E[x]
//! hₖ₊₁ = hₖ + hₖ·Wₖᵀ (+ s·(drop(hₖ)·Aₖᵀ)·Bₖᵀ with an adapter)
//! logits = h_L·Uᵀ
//! ```
//!
//! The loss is next-token cross entropy; gradients are computed analytically.
//! Other weights of the checkpoint (norms, rectangular projections) are
//! carried along so the model saves back to a complete checkpoint.

use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, ArrayD};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::config::ModelConfig;
use super::error::{ModelError, Result};
use super::linear::{BaseWeight, Linear};
use super::names::{find_embedding, find_head, module_of, natural_cmp};
use super::trainable::{Batch, ParameterCount, StepOutput};
use crate::io::TensorMap;
use crate::lora::{lora_a_name, lora_b_name, AdapterError, LoraConfig, LoraLayer, ModelFamily};
use crate::parameter::Parameter;

struct LoraCache {
    dropped: Array2<f32>,
    projected: Array2<f32>,
    mask: Option<Array2<f32>>,
}

struct LayerCache {
    index: usize,
    input: Array2<f32>,
    lora: Option<LoraCache>,
}

#[derive(Debug, Clone)]
pub struct CausalLm {
    config: ModelConfig,
    embed: Parameter,
    head: Option<Parameter>,
    linears: Vec<Linear>,
    others: Vec<Parameter>,
    fan_in_fan_out: bool,
    rng: StdRng,
}

impl CausalLm {
    /// Assemble the model from checkpoint tensors
    ///
    /// The checkpoint must contain a 2-D token embedding. Every other 2-D
    /// `*.weight` becomes a [`Linear`], ordered by name with numeric
    /// segments compared by value. Families with Conv1D weights get
    /// `[in, out]` linears.
    pub fn from_tensors(config: ModelConfig, mut tensors: TensorMap, trainable: bool) -> Result<Self> {
        let embed_name = find_embedding(&tensors)
            .ok_or_else(|| ModelError::MissingWeight("token embedding".to_string()))?;
        let embed_value = tensors
            .remove(&embed_name)
            .ok_or_else(|| ModelError::MissingWeight(embed_name.clone()))?;
        if embed_value.ndim() != 2 {
            return Err(ModelError::Config(format!(
                "{embed_name} must be 2-D, got shape {:?}",
                embed_value.shape()
            )));
        }

        let head = match find_head(&tensors) {
            Some(name) => {
                let value = tensors
                    .remove(&name)
                    .ok_or_else(|| ModelError::MissingWeight(name.clone()))?;
                if value.shape() != embed_value.shape() {
                    return Err(ModelError::shape(&name, embed_value.shape(), value.shape()));
                }
                Some(Parameter::new(name, value, trainable))
            }
            None => None,
        };

        let mut entries: Vec<(String, ArrayD<f32>)> = tensors.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| natural_cmp(a, b));

        let fan_in_fan_out = config
            .model_type()
            .and_then(|model_type| ModelFamily::from_model_type(model_type).ok())
            .is_some_and(ModelFamily::fan_in_fan_out);

        let mut linears = Vec::new();
        let mut others = Vec::new();
        for (name, value) in entries {
            if value.ndim() == 2 && name.ends_with(".weight") {
                let module = module_of(&name).to_string();
                linears.push(
                    Linear::new(module, Parameter::new(name, value, trainable))
                        .with_fan_in_fan_out(fan_in_fan_out),
                );
            } else {
                others.push(Parameter::new(name, value, trainable));
            }
        }

        Ok(Self {
            config,
            embed: Parameter::new(embed_name, embed_value, trainable),
            head,
            linears,
            others,
            fan_in_fan_out,
            rng: StdRng::seed_from_u64(0),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ModelConfig {
        &mut self.config
    }

    /// Whether projections are stored `[in, out]`
    #[must_use]
    pub fn fan_in_fan_out(&self) -> bool {
        self.fan_in_fan_out
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.embed.shape()[0]
    }

    #[must_use]
    pub fn hidden_size(&self) -> usize {
        self.embed.shape()[1]
    }

    #[must_use]
    pub fn embedding(&self) -> &Parameter {
        &self.embed
    }

    /// Untied LM head
    #[must_use]
    pub fn head(&self) -> Option<&Parameter> {
        self.head.as_ref()
    }

    #[must_use]
    pub fn linears(&self) -> &[Linear] {
        &self.linears
    }

    pub fn linears_mut(&mut self) -> &mut [Linear] {
        &mut self.linears
    }

    /// Reseed the dropout generator
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Mark every base weight non-trainable
    pub fn freeze_base(&mut self) {
        for param in self.base_parameters_mut() {
            param.set_requires_grad(false);
        }
    }

    /// Round every dense base weight through `f16`
    pub fn round_base_to_f16(&mut self) {
        for linear in &mut self.linears {
            linear.round_to_f16();
        }
        let round = |param: &mut Parameter| {
            param
                .value_mut()
                .mapv_inplace(|v| half::f16::from_f32(v).to_f32());
        };
        round(&mut self.embed);
        if let Some(head) = self.head.as_mut() {
            round(head);
        }
        self.others.iter_mut().for_each(round);
    }

    /// Attach fresh adapters to every projection matching the targets
    ///
    /// Returns the adapted module paths.
    pub fn inject_adapters(&mut self, config: &LoraConfig) -> Result<Vec<String>> {
        let mut adapted = Vec::new();
        for linear in &mut self.linears {
            if !config.is_target(linear.module()) {
                continue;
            }
            let layer = LoraLayer::new(
                linear.module(),
                linear.in_features(),
                linear.out_features(),
                config,
                &mut self.rng,
            );
            linear.attach(layer)?;
            adapted.push(linear.module().to_string());
        }
        if adapted.is_empty() {
            return Err(AdapterError::NoTargetModules(config.target_modules.clone()).into());
        }
        debug!(count = adapted.len(), "injected LoRA adapters");
        Ok(adapted)
    }

    pub fn adapters(&self) -> impl Iterator<Item = &LoraLayer> {
        self.linears.iter().filter_map(Linear::adapter)
    }

    /// Dense base weights: embedding, head, projections, then the rest
    pub fn base_parameters_mut(&mut self) -> Vec<&mut Parameter> {
        let mut params = vec![&mut self.embed];
        params.extend(self.head.as_mut());
        params.extend(self.linears.iter_mut().filter_map(Linear::dense_mut));
        params.extend(self.others.iter_mut());
        params
    }

    /// Adapter matrices, A before B for each module
    pub fn adapter_parameters_mut(&mut self) -> Vec<&mut Parameter> {
        self.linears
            .iter_mut()
            .filter_map(Linear::adapter_mut)
            .flat_map(LoraLayer::params_mut)
            .collect()
    }

    /// Total and trainable scalar counts
    #[must_use]
    pub fn parameter_count(&self) -> ParameterCount {
        let mut count = ParameterCount::default();
        let mut add = |numel: usize, trainable: bool| {
            count.total += numel;
            if trainable {
                count.trainable += numel;
            }
        };
        add(self.embed.numel(), self.embed.requires_grad());
        if let Some(head) = &self.head {
            add(head.numel(), head.requires_grad());
        }
        for linear in &self.linears {
            match linear.base() {
                BaseWeight::Dense(param) => add(param.numel(), param.requires_grad()),
                BaseWeight::Int8 { .. } => add(linear.base().numel(), false),
            }
            if let Some(adapter) = linear.adapter() {
                add(adapter.a().numel(), adapter.a().requires_grad());
                add(adapter.b().numel(), adapter.b().requires_grad());
            }
        }
        for param in &self.others {
            add(param.numel(), param.requires_grad());
        }
        count
    }

    /// Base weights in checkpoint naming, dequantized where needed
    pub fn base_tensors(&self) -> Result<Vec<(String, ArrayD<f32>)>> {
        let mut tensors = vec![(self.embed.name().to_string(), self.embed.value().clone())];
        if let Some(head) = &self.head {
            tensors.push((head.name().to_string(), head.value().clone()));
        }
        for linear in &self.linears {
            let value = linear.base().matrix()?.into_owned().into_dyn();
            tensors.push((linear.base().name().to_string(), value));
        }
        for param in &self.others {
            tensors.push((param.name().to_string(), param.value().clone()));
        }
        Ok(tensors)
    }

    /// Adapter matrices named `{module}.lora_A.weight` / `{module}.lora_B.weight`
    #[must_use]
    pub fn adapter_tensors(&self) -> Vec<(String, ArrayD<f32>)> {
        self.adapters()
            .flat_map(|layer| {
                [
                    (layer.a().name().to_string(), layer.a().value().clone()),
                    (layer.b().name().to_string(), layer.b().value().clone()),
                ]
            })
            .collect()
    }

    /// Overwrite dense base weights from a tensor map; returns how many were set
    pub fn load_base(&mut self, tensors: &TensorMap) -> Result<usize> {
        let mut loaded = 0;
        for param in self.base_parameters_mut() {
            if let Some(value) = tensors.get(param.name()) {
                if value.shape() != param.shape() {
                    return Err(ModelError::shape(param.name(), param.shape(), value.shape()));
                }
                param.set_value(value.clone());
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Overwrite adapter matrices from a tensor map keyed by module path
    pub fn load_adapters(&mut self, tensors: &TensorMap) -> Result<usize> {
        let mut loaded = 0;
        for linear in &mut self.linears {
            let module = linear.module().to_string();
            let Some(adapter) = linear.adapter_mut() else {
                continue;
            };
            let a_name = lora_a_name(&module);
            let b_name = lora_b_name(&module);
            let a = tensors
                .get(&a_name)
                .ok_or_else(|| AdapterError::MissingTensor(a_name.clone()))?;
            let b = tensors
                .get(&b_name)
                .ok_or_else(|| AdapterError::MissingTensor(b_name.clone()))?;
            adapter.load(a.clone(), b.clone())?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Loss and accumulated gradients for one batch
    ///
    /// Gradients are scaled by `grad_scale` (e.g. `1 / accumulation_steps`).
    pub fn forward_backward(&mut self, batch: &Batch, grad_scale: f32) -> Result<StepOutput> {
        self.run(batch, grad_scale, true)
    }

    /// Loss without gradients or dropout
    pub fn eval_loss(&mut self, batch: &Batch) -> Result<StepOutput> {
        self.run(batch, 0.0, false)
    }

    fn run(&mut self, batch: &Batch, grad_scale: f32, training: bool) -> Result<StepOutput> {
        let (batch_size, seq_len) = batch.input_ids.dim();
        if batch.labels.dim() != (batch_size, seq_len) {
            return Err(ModelError::shape(
                "labels",
                &[batch_size, seq_len],
                batch.labels.shape(),
            ));
        }
        let vocab = self.vocab_size();
        let hidden = self.hidden_size();
        let num_targets = batch.num_targets();
        if num_targets == 0 {
            return Ok(StepOutput::default());
        }
        let rows = batch_size * seq_len;

        let mut h = Array2::<f32>::zeros((rows, hidden));
        {
            let embed = self.embed.matrix()?;
            for (i, &id) in batch.input_ids.iter().enumerate() {
                let idx = id as usize;
                if idx >= vocab {
                    return Err(ModelError::TokenOutOfRange { id, vocab_size: vocab });
                }
                h.row_mut(i).assign(&embed.row(idx));
            }
        }

        let square: Vec<usize> = (0..self.linears.len())
            .filter(|&i| self.linears[i].is_square(hidden))
            .collect();

        let mut caches = Vec::with_capacity(square.len());
        for &index in &square {
            let linear = &self.linears[index];
            let weight = linear.weight()?;
            let mut z = h.dot(&weight.t());
            let lora = match linear.adapter() {
                Some(adapter) => {
                    let p = adapter.dropout();
                    let mask = (training && p > 0.0).then(|| {
                        let keep = 1.0 / (1.0 - p);
                        Array2::from_shape_fn(h.dim(), |_| {
                            if self.rng.gen::<f32>() < p {
                                0.0
                            } else {
                                keep
                            }
                        })
                    });
                    let dropped = match &mask {
                        Some(mask) => &h * mask,
                        None => h.clone(),
                    };
                    let projected = dropped.dot(&adapter.a().matrix()?.t());
                    z.scaled_add(adapter.scale(), &projected.dot(&adapter.b().matrix()?.t()));
                    Some(LoraCache {
                        dropped,
                        projected,
                        mask,
                    })
                }
                None => None,
            };
            let next = &h + &z;
            caches.push(LayerCache {
                index,
                input: h,
                lora,
            });
            h = next;
        }

        let mut selected = Array2::<f32>::zeros((num_targets, hidden));
        let mut targets = Vec::with_capacity(num_targets);
        let mut source_rows = Vec::with_capacity(num_targets);
        for b in 0..batch_size {
            for t in 0..seq_len - 1 {
                let row = b * seq_len + t;
                let target = batch.labels[[b, t + 1]];
                if target as usize >= vocab {
                    return Err(ModelError::TokenOutOfRange {
                        id: target,
                        vocab_size: vocab,
                    });
                }
                selected.row_mut(source_rows.len()).assign(&h.row(row));
                targets.push(target as usize);
                source_rows.push(row);
            }
        }

        let logits_len = num_targets.checked_mul(vocab);
        let mut buffer: Vec<f32> = Vec::new();
        let reserved = logits_len.map(|len| buffer.try_reserve_exact(len));
        let Some(Ok(())) = reserved else {
            return Err(ModelError::ResourceExhausted {
                what: "logits".to_string(),
                bytes: logits_len
                    .and_then(|len| len.checked_mul(std::mem::size_of::<f32>()))
                    .unwrap_or(usize::MAX),
            });
        };
        buffer.resize(num_targets * vocab, 0.0);
        let mut logits = Array2::from_shape_vec((num_targets, vocab), buffer)?;
        {
            let unembed = match &self.head {
                Some(head) => head.matrix()?,
                None => self.embed.matrix()?,
            };
            general_mat_mul(1.0, &selected, &unembed.t(), 0.0, &mut logits);
        }

        let inv_n = grad_scale / num_targets as f32;
        let mut total = 0.0f64;
        for (mut row, &target) in logits.rows_mut().into_iter().zip(&targets) {
            let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            let target_logit = row[target];
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            total += f64::from(sum.ln() + max - target_logit);
            if training {
                row.mapv_inplace(|v| v / sum * inv_n);
                row[target] -= inv_n;
            }
        }
        let output = StepOutput {
            loss: (total / num_targets as f64) as f32,
            num_tokens: num_targets,
        };
        if !training {
            return Ok(output);
        }

        // logits now hold dL/dlogits
        let d_unembed = logits.t().dot(&selected);
        let d_selected = {
            let unembed = match &self.head {
                Some(head) => head.matrix()?,
                None => self.embed.matrix()?,
            };
            logits.dot(&unembed)
        };
        drop(logits);

        let mut dh = Array2::<f32>::zeros((rows, hidden));
        for (k, &row) in source_rows.iter().enumerate() {
            dh.row_mut(row).assign(&d_selected.row(k));
        }

        for cache in caches.into_iter().rev() {
            let linear = &mut self.linears[cache.index];
            let mut dh_in = dh.dot(&linear.weight()?);
            dh_in += &dh;

            let transposed = linear.fan_in_fan_out();
            if let Some(param) = linear.dense_mut() {
                if param.requires_grad() {
                    let grad = dh.t().dot(&cache.input);
                    let grad = if transposed { grad.reversed_axes() } else { grad };
                    param.accumulate_grad(&grad.into_dyn())?;
                }
            }

            if let (Some(adapter), Some(lora)) = (linear.adapter_mut(), cache.lora) {
                let scale = adapter.scale();
                let d_b = dh.t().dot(&lora.projected) * scale;
                let d_projected = dh.dot(&adapter.b().matrix()?) * scale;
                let d_a = d_projected.t().dot(&lora.dropped);
                let mut d_dropped = d_projected.dot(&adapter.a().matrix()?);
                if let Some(mask) = &lora.mask {
                    d_dropped *= mask;
                }
                dh_in += &d_dropped;
                adapter.a_mut().accumulate_grad(&d_a.into_dyn())?;
                adapter.b_mut().accumulate_grad(&d_b.into_dyn())?;
            }

            dh = dh_in;
        }

        if self.embed.requires_grad() {
            let mut d_embed = Array2::<f32>::zeros((vocab, hidden));
            for (i, &id) in batch.input_ids.iter().enumerate() {
                let mut row = d_embed.row_mut(id as usize);
                row += &dh.row(i);
            }
            if self.head.is_none() {
                d_embed += &d_unembed;
            }
            self.embed.accumulate_grad(&d_embed.into_dyn())?;
        }
        if let Some(head) = self.head.as_mut() {
            if head.requires_grad() {
                head.accumulate_grad(&d_unembed.into_dyn())?;
            }
        }

        Ok(output)
    }
}
