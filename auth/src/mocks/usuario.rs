//! Mock operator repository.

use crate::error::{AuthError, Result};
use crate::providers::UsuarioRepository;
use crate::state::{NuevoUsuario, Usuario, UsuarioCambios, UsuarioId};
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

/// Mock operator repository.
///
/// Rows live in an id-ordered map behind one mutex. Ids ascend from 1
/// and are never reused after a delete, like a database sequence.
#[derive(Debug, Clone, Default)]
pub struct MockUsuarioRepository {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    usuarios: BTreeMap<i64, Usuario>,
    next_id: i64,
}

fn lock(inner: &Mutex<Inner>) -> Result<MutexGuard<'_, Inner>> {
    inner
        .lock()
        .map_err(|_| AuthError::DatabaseError("usuario lock poisoned".to_string()))
}

impl UsuarioRepository for MockUsuarioRepository {
    fn list(&self) -> impl Future<Output = Result<Vec<Usuario>>> + Send {
        let inner = Arc::clone(&self.inner);
        async move { Ok(lock(&inner)?.usuarios.values().cloned().collect()) }
    }

    fn get(&self, id: UsuarioId) -> impl Future<Output = Result<Usuario>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            lock(&inner)?
                .usuarios
                .get(&id.0)
                .cloned()
                .ok_or(AuthError::UsuarioNotFound)
        }
    }

    fn get_by_username(&self, username: &str) -> impl Future<Output = Result<Usuario>> + Send {
        let inner = Arc::clone(&self.inner);
        let username = username.to_string();
        async move {
            lock(&inner)?
                .usuarios
                .values()
                .find(|u| u.username == username)
                .cloned()
                .ok_or(AuthError::UsuarioNotFound)
        }
    }

    fn create(&self, nuevo: &NuevoUsuario) -> impl Future<Output = Result<Usuario>> + Send {
        let inner = Arc::clone(&self.inner);
        let nuevo = nuevo.clone();
        async move {
            let mut inner = lock(&inner)?;
            if inner.usuarios.values().any(|u| u.username == nuevo.username) {
                return Err(AuthError::UsernameTaken);
            }
            inner.next_id += 1;
            let now = Utc::now();
            let usuario = Usuario {
                id: UsuarioId(inner.next_id),
                username: nuevo.username,
                nombre_completo: nuevo.nombre_completo,
                hashed_password: nuevo.hashed_password,
                created_at: now,
                updated_at: now,
            };
            inner.usuarios.insert(usuario.id.0, usuario.clone());
            Ok(usuario)
        }
    }

    fn update(
        &self,
        id: UsuarioId,
        cambios: &UsuarioCambios,
    ) -> impl Future<Output = Result<Usuario>> + Send {
        let inner = Arc::clone(&self.inner);
        let cambios = cambios.clone();
        async move {
            let mut inner = lock(&inner)?;
            if !inner.usuarios.contains_key(&id.0) {
                return Err(AuthError::UsuarioNotFound);
            }
            let taken = inner
                .usuarios
                .values()
                .any(|u| u.username == cambios.username && u.id != id);
            if taken {
                return Err(AuthError::UsernameTaken);
            }
            let Some(usuario) = inner.usuarios.get_mut(&id.0) else {
                return Err(AuthError::UsuarioNotFound);
            };
            usuario.username = cambios.username;
            usuario.nombre_completo = cambios.nombre_completo;
            if let Some(hash) = cambios.hashed_password {
                usuario.hashed_password = hash;
            }
            usuario.updated_at = Utc::now();
            Ok(usuario.clone())
        }
    }

    fn delete(&self, id: UsuarioId) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            lock(&inner)?
                .usuarios
                .remove(&id.0)
                .map(|_| ())
                .ok_or(AuthError::UsuarioNotFound)
        }
    }
}
