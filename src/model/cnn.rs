//! CNN Model Architecture for Crop Disease Classification
//!
//! Four convolutional blocks followed by global average pooling and a
//! two-layer fully connected head with batch norm and dropout. Channel widths,
//! head width and dropout rates come from the [`ModelVariant`].

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use super::config::{ClassifierConfig, ModelVariant};
use super::Classifier;

/// A CNN block: Conv2d, BatchNorm, ReLU, optional dropout, 2x2 MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B>,
    pub relu: Relu,
    pub dropout: Option<Dropout>,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    /// Create a new convolutional block
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        dropout: Option<f64>,
        device: &B::Device,
    ) -> Self {
        let padding = kernel_size / 2;
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);

        Self {
            conv,
            bn,
            relu: Relu::new(),
            dropout: dropout.map(|prob| DropoutConfig::new(prob).init()),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    /// Forward pass through the block
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);

        let x = match &self.dropout {
            Some(dropout) => dropout.forward(x),
            None => x,
        };

        self.pool.forward(x)
    }
}

/// Crop Disease Classifier CNN
///
/// Architecture:
/// - 4 convolutional blocks (3x3 conv, padding 1) with BatchNorm, ReLU and 2x2 MaxPool
/// - Global Average Pooling
/// - Linear -> BatchNorm -> ReLU -> Dropout -> Linear head
///
/// Input size is not fixed by the weights; the global pool collapses any
/// spatial extent that survives four halvings.
#[derive(Module, Debug)]
pub struct DiseaseClassifier<B: Backend> {
    pub blocks: Vec<ConvBlock<B>>,
    pub global_pool: AdaptiveAvgPool2d,

    pub fc1: Linear<B>,
    pub fc_bn: BatchNorm<B>,
    pub relu: Relu,
    pub dropout: Dropout,
    pub fc2: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> DiseaseClassifier<B> {
    /// Build a freshly initialized classifier for the given configuration
    pub fn new(config: &ClassifierConfig, device: &B::Device) -> Self {
        let variant: ModelVariant = config.variant;
        let channels = variant.conv_channels();
        let last = channels.len() - 1;

        let mut blocks = Vec::with_capacity(channels.len());
        let mut in_channels = config.in_channels;
        for (i, &out_channels) in channels.iter().enumerate() {
            let dropout = if i == last {
                variant.last_block_dropout()
            } else {
                None
            };
            blocks.push(ConvBlock::new(
                in_channels,
                out_channels,
                config.kernel_size,
                dropout,
                device,
            ));
            in_channels = out_channels;
        }

        let hidden = variant.hidden_units();

        Self {
            blocks,
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1: LinearConfig::new(in_channels, hidden).init(device),
            fc_bn: BatchNormConfig::new(hidden).init(device),
            relu: Relu::new(),
            dropout: DropoutConfig::new(variant.head_dropout()).init(),
            fc2: LinearConfig::new(hidden, config.num_classes).init(device),
            num_classes: config.num_classes,
        }
    }

    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = x;
        for block in &self.blocks {
            x = block.forward(x);
        }

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = self.fc_bn.forward(x);
        let x = self.relu.forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Shapes of every convolution, batch-norm and linear weight, by record path
    pub fn parameter_shapes(&self) -> Vec<(String, Vec<usize>)> {
        let mut shapes = Vec::with_capacity(self.blocks.len() * 2 + 3);

        for (i, block) in self.blocks.iter().enumerate() {
            shapes.push((
                format!("blocks.{}.conv.weight", i),
                block.conv.weight.val().dims().to_vec(),
            ));
            shapes.push((
                format!("blocks.{}.bn.gamma", i),
                block.bn.gamma.val().dims().to_vec(),
            ));
        }

        shapes.push(("fc1.weight".to_string(), self.fc1.weight.val().dims().to_vec()));
        shapes.push(("fc_bn.gamma".to_string(), self.fc_bn.gamma.val().dims().to_vec()));
        shapes.push(("fc2.weight".to_string(), self.fc2.weight.val().dims().to_vec()));

        shapes
    }
}

impl<B: Backend> Classifier<B> for DiseaseClassifier<B> {
    fn logits(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(input)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}
