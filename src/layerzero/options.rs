use alloy::primitives::Bytes;

const TYPE_3: u16 = 3;
const WORKER_ID_EXECUTOR: u8 = 1;
const OPTION_TYPE_LZRECEIVE: u8 = 1;

/// Builder for LayerZero type-3 options.
///
/// Each executor option is encoded as `workerId (u8) ‖ size (u16) ‖ optionType (u8) ‖ params`,
/// where `size` counts the option type byte plus its params.
#[derive(Debug, Clone)]
pub struct OptionsBuilder {
    options: Vec<u8>,
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsBuilder {
    /// Creates an empty type-3 options buffer.
    pub fn new() -> Self {
        Self { options: TYPE_3.to_be_bytes().to_vec() }
    }

    /// Adds an executor `lzReceive` option.
    ///
    /// `value` is the native amount forwarded to `lzReceive` and is omitted from the
    /// encoding when zero.
    pub fn add_executor_lz_receive_option(mut self, gas: u128, value: u128) -> Self {
        let mut params = gas.to_be_bytes().to_vec();
        if value != 0 {
            params.extend_from_slice(&value.to_be_bytes());
        }

        // params are at most 32 bytes
        let size = (params.len() + 1) as u16;

        self.options.push(WORKER_ID_EXECUTOR);
        self.options.extend_from_slice(&size.to_be_bytes());
        self.options.push(OPTION_TYPE_LZRECEIVE);
        self.options.extend_from_slice(&params);
        self
    }

    pub fn build(self) -> Bytes {
        self.options.into()
    }
}
