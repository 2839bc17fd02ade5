//! Function-name-to-operation mapping exposed to the host dispatcher.

use std::{fmt, str::FromStr};

use common::UdfError;
use tracing::{debug, instrument};

use crate::clickstream::{self, RecordShape};
use crate::codec;
use crate::crypto;
use crate::secrets::{SecretCache, SecretStore};

/// A function exported to the host, addressed by its host-visible name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UdfFunction {
    Compress,
    Decompress,
    ClickstreamCommonFields,
    ClickstreamAttributeFields,
    ClickstreamUserFields,
    Encrypt,
    Decrypt,
}

impl UdfFunction {
    /// Every exported function.
    pub const ALL: [UdfFunction; 7] = [
        UdfFunction::Compress,
        UdfFunction::Decompress,
        UdfFunction::ClickstreamCommonFields,
        UdfFunction::ClickstreamAttributeFields,
        UdfFunction::ClickstreamUserFields,
        UdfFunction::Encrypt,
        UdfFunction::Decrypt,
    ];

    /// Name under which the host invokes this function.
    pub fn name(self) -> &'static str {
        match self {
            UdfFunction::Compress => "compress",
            UdfFunction::Decompress => "decompress",
            UdfFunction::ClickstreamCommonFields => "decompress_clickstream_common_fields",
            UdfFunction::ClickstreamAttributeFields => "decompress_clickstream_attribute_fields",
            UdfFunction::ClickstreamUserFields => "decompress_clickstream_user_fields",
            UdfFunction::Encrypt => "encrypt",
            UdfFunction::Decrypt => "decrypt",
        }
    }

    /// Number of arguments the host must pass.
    pub fn arity(self) -> usize {
        match self {
            UdfFunction::Encrypt | UdfFunction::Decrypt => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for UdfFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UdfFunction {
    type Err = UdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UdfFunction::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| UdfError::UnknownFunction(s.to_owned()))
    }
}

/// The UDF library: stateless operations plus the shared [`SecretCache`].
#[derive(Debug)]
pub struct Udfs<S> {
    secrets: SecretCache<S>,
}

impl<S: SecretStore> Udfs<S> {
    /// Create the library with an empty key cache in front of `store`.
    pub fn new(store: S) -> Self {
        Self {
            secrets: SecretCache::new(store),
        }
    }

    /// The process-lifetime key cache.
    pub fn secrets(&self) -> &SecretCache<S> {
        &self.secrets
    }

    /// Run `function` over one row of arguments.
    ///
    /// A `null` data argument short-circuits to `null` before any other
    /// argument is checked or any decode/crypto work happens.
    ///
    /// # Errors
    ///
    /// [`UdfError::InvalidArguments`] for a wrong argument count or a `null`
    /// secret name; otherwise whatever the operation raises.
    pub async fn invoke(
        &self,
        function: UdfFunction,
        args: &[Option<String>],
    ) -> Result<Option<String>, UdfError> {
        if args.len() != function.arity() {
            return Err(UdfError::InvalidArguments(format!(
                "{function} expects {} argument(s), got {}",
                function.arity(),
                args.len()
            )));
        }

        let data = args[0].as_deref();
        match function {
            UdfFunction::Compress => codec::compress(data),
            UdfFunction::Decompress => codec::decompress(data),
            UdfFunction::ClickstreamCommonFields => clickstream::decode(data, RecordShape::Event),
            UdfFunction::ClickstreamAttributeFields => {
                clickstream::decode(data, RecordShape::Attribute)
            }
            UdfFunction::ClickstreamUserFields => clickstream::decode(data, RecordShape::User),
            UdfFunction::Encrypt => match data {
                None => Ok(None),
                Some(_) => crypto::encrypt(data, secret_name(function, args)?, &self.secrets).await,
            },
            UdfFunction::Decrypt => match data {
                None => Ok(None),
                Some(_) => crypto::decrypt(data, secret_name(function, args)?, &self.secrets).await,
            },
        }
    }

    /// Run `function` over every row in order.
    ///
    /// # Errors
    ///
    /// Fails the whole batch with the first row error.
    #[instrument(skip(self, function, rows), fields(function = %function, rows = rows.len()))]
    pub async fn invoke_batch(
        &self,
        function: UdfFunction,
        rows: &[Vec<Option<String>>],
    ) -> Result<Vec<Option<String>>, UdfError> {
        let mut values = Vec::with_capacity(rows.len());
        for (row, args) in rows.iter().enumerate() {
            let value = self.invoke(function, args).await.map_err(|e| {
                debug!(row, code = e.code(), "row failed");
                e
            })?;
            values.push(value);
        }
        Ok(values)
    }
}

fn secret_name(function: UdfFunction, args: &[Option<String>]) -> Result<&str, UdfError> {
    args.get(1)
        .and_then(|a| a.as_deref())
        .ok_or_else(|| UdfError::InvalidArguments(format!("{function} requires a secret name")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{MockSecretStore, SecretStoreError};

    const KEY_B64: &str = "QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI=";

    fn udfs() -> Udfs<MockSecretStore> {
        let mut store = MockSecretStore::new();
        store
            .expect_fetch_secret_value()
            .withf(|name| name == "prod/pii-key")
            .returning(|_| Ok(KEY_B64.to_owned()));
        store
            .expect_fetch_secret_value()
            .withf(|name| name != "prod/pii-key")
            .returning(|name| Err(SecretStoreError::NotFound(name.to_owned())));
        Udfs::new(store)
    }

    fn row(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_owned)).collect()
    }

    #[test]
    fn names_round_trip() {
        for function in UdfFunction::ALL {
            assert_eq!(function.name().parse::<UdfFunction>(), Ok(function));
        }
    }

    #[test]
    fn unknown_name_rejected() {
        assert_eq!(
            "compress_all".parse::<UdfFunction>(),
            Err(UdfError::UnknownFunction("compress_all".into()))
        );
    }

    #[tokio::test]
    async fn compress_then_decompress() {
        let udfs = udfs();
        let compressed = udfs
            .invoke(UdfFunction::Compress, &row(&[Some("hello")]))
            .await
            .unwrap();
        let plain = udfs
            .invoke(UdfFunction::Decompress, &[compressed])
            .await
            .unwrap();
        assert_eq!(plain.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn encrypt_then_decrypt() {
        let udfs = udfs();
        let ct = udfs
            .invoke(UdfFunction::Encrypt, &row(&[Some("4111 1111"), Some("prod/pii-key")]))
            .await
            .unwrap();
        let pt = udfs
            .invoke(
                UdfFunction::Decrypt,
                &[ct, Some("prod/pii-key".to_owned())],
            )
            .await
            .unwrap();
        assert_eq!(pt.as_deref(), Some("4111 1111"));
    }

    #[tokio::test]
    async fn wrong_arity_rejected() {
        let udfs = udfs();
        let err = udfs
            .invoke(UdfFunction::Encrypt, &row(&[Some("x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, UdfError::InvalidArguments(_)));
        let err = udfs
            .invoke(UdfFunction::Compress, &row(&[Some("x"), Some("y")]))
            .await
            .unwrap_err();
        assert!(matches!(err, UdfError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn null_data_wins_over_null_secret() {
        let udfs = udfs();
        let out = udfs
            .invoke(UdfFunction::Encrypt, &row(&[None, None]))
            .await
            .unwrap();
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn null_secret_name_rejected() {
        let udfs = udfs();
        let err = udfs
            .invoke(UdfFunction::Decrypt, &row(&[Some("AAAA"), None]))
            .await
            .unwrap_err();
        assert!(matches!(err, UdfError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn missing_secret_surfaces_as_secret_unavailable() {
        let udfs = udfs();
        for function in [UdfFunction::Encrypt, UdfFunction::Decrypt] {
            let err = udfs
                .invoke(function, &row(&[Some("AAAA"), Some("absent")]))
                .await
                .unwrap_err();
            assert!(matches!(err, UdfError::SecretUnavailable(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn batch_preserves_order_and_nulls() {
        let udfs = udfs();
        let rows = vec![row(&[Some("a")]), row(&[None]), row(&[Some("b")])];
        let compressed = udfs
            .invoke_batch(UdfFunction::Compress, &rows)
            .await
            .unwrap();
        assert_eq!(compressed[1], None);

        let back: Vec<_> = compressed.into_iter().map(|v| vec![v]).collect();
        let plain = udfs
            .invoke_batch(UdfFunction::Decompress, &back)
            .await
            .unwrap();
        assert_eq!(plain, vec![Some("a".into()), None, Some("b".into())]);
    }

    #[tokio::test]
    async fn batch_fails_on_first_bad_row() {
        let udfs = udfs();
        let rows = vec![row(&[Some("eJzLSM3JyQcABiwCFQ==")]), row(&[Some("!!")])];
        let err = udfs
            .invoke_batch(UdfFunction::Decompress, &rows)
            .await
            .unwrap_err();
        assert!(matches!(err, UdfError::MalformedCompressedData(_)));
    }
}
