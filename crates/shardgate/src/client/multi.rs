use crate::{Backend, Command, Error, GatedClient, Reply};

/// Per-group outcome of a [`GatedClient::scatter`]: the input positions of
/// the group and whatever the group's sub-call produced.
pub type ShardOutput<R> = (Vec<usize>, R);

impl<B: Backend> GatedClient<B> {
    /// Splits `items` by the shard of `key_of(item)` and runs `call` once per
    /// shard group, at most `max_parallel_shards` groups at a time.
    ///
    /// `call` receives the group's items in input order and should issue its
    /// sub-request through [`execute`] so that it is gated like any other
    /// operation. The groups' input positions are returned alongside each
    /// output, which is enough to restore input order.
    ///
    /// If any group fails, groups that have not started yet are skipped and
    /// one of the failures is returned.
    ///
    /// [`execute`]: GatedClient::execute
    pub fn scatter<I, R, K, F>(
        &self,
        items: &[I],
        key_of: K,
        call: F,
    ) -> Result<Vec<ShardOutput<R>>, Error<B::Error>>
    where
        I: Sync,
        R: Send,
        K: Fn(&I) -> &[u8],
        F: Fn(&[&I]) -> Result<R, Error<B::Error>> + Sync,
    {
        let keys: Vec<&[u8]> = items.iter().map(&key_of).collect();
        let groups = self.router().group_indices(&keys);
        let call = &call;
        self.fan_out().try_map(groups.into_values().map(move |indices| {
            move || -> Result<ShardOutput<R>, Error<B::Error>> {
                let group: Vec<&I> = indices.iter().map(|&i| &items[i]).collect();
                let output = call(group.as_slice())?;
                Ok((indices, output))
            }
        }))
    }
}

impl<B> GatedClient<B>
where
    B: Backend<Op = Command, Reply = Reply>,
{
    /// Fetches the values of `keys`, in input order. Missing keys map to
    /// `None`.
    ///
    /// # Errors
    ///
    /// Any error of a shard group's `MGET`, or [`Error::UnexpectedReply`] if
    /// a group's reply does not hold one value per key.
    pub fn mget<K>(&self, keys: &[K]) -> Result<Vec<Option<Vec<u8>>>, Error<B::Error>>
    where
        K: AsRef<[u8]> + Sync,
    {
        let groups = self.scatter(keys, |k| k.as_ref(), |group| {
            let reply = self.execute(&Command::new("MGET").args(group))?;
            reply
                .into_array()
                .map_err(|r| unexpected::<B::Error>("MGET", &r))?
                .into_iter()
                .map(|item| item.into_bulk().map_err(|r| unexpected("MGET", &r)))
                .collect::<Result<Vec<_>, _>>()
        })?;
        reassemble(keys.len(), groups, "MGET")
    }

    /// Sets every `(key, value)` pair. Each shard group is set atomically,
    /// the call as a whole is not.
    pub fn mset<K, V>(&self, pairs: &[(K, V)]) -> Result<(), Error<B::Error>>
    where
        K: AsRef<[u8]> + Sync,
        V: AsRef<[u8]> + Sync,
    {
        self.scatter(pairs, |(k, _)| k.as_ref(), |group| {
            let reply = self.execute(&mset_command("MSET", group))?;
            if reply.is_ok() {
                Ok(())
            } else {
                Err(unexpected("MSET", &reply))
            }
        })?;
        Ok(())
    }

    /// Sets the pairs of every shard group whose keys all do not exist yet.
    ///
    /// Returns `true` only if every group was set. The check is per group: a
    /// `false` result may still have set the keys of other groups.
    pub fn msetnx<K, V>(&self, pairs: &[(K, V)]) -> Result<bool, Error<B::Error>>
    where
        K: AsRef<[u8]> + Sync,
        V: AsRef<[u8]> + Sync,
    {
        let groups = self.scatter(pairs, |(k, _)| k.as_ref(), |group| {
            let reply = self.execute(&mset_command("MSETNX", group))?;
            match reply.as_integer() {
                Some(n) => Ok(n == 1),
                None => Err(unexpected("MSETNX", &reply)),
            }
        })?;
        Ok(groups.iter().all(|(_, set)| *set))
    }

    /// Deletes `keys`, returning how many existed.
    pub fn del<K>(&self, keys: &[K]) -> Result<i64, Error<B::Error>>
    where
        K: AsRef<[u8]> + Sync,
    {
        let groups = self.scatter(keys, |k| k.as_ref(), |group| {
            let reply = self.execute(&Command::new("DEL").args(group))?;
            reply.as_integer().ok_or_else(|| unexpected("DEL", &reply))
        })?;
        Ok(groups.into_iter().map(|(_, n)| n).sum())
    }
}

fn mset_command<K, V>(name: &str, group: &[&(K, V)]) -> Command
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let mut cmd = Command::new(name);
    for (k, v) in group {
        cmd.push_arg(k);
        cmd.push_arg(v);
    }
    cmd
}

fn unexpected<E>(operation: &str, reply: &Reply) -> Error<E> {
    Error::UnexpectedReply {
        operation: operation.to_owned(),
        reply: reply.to_string(),
    }
}

/// Places each group's per-item outputs back at their input positions.
fn reassemble<T, E>(
    len: usize,
    groups: Vec<ShardOutput<Vec<T>>>,
    operation: &str,
) -> Result<Vec<T>, Error<E>> {
    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    for (indices, outputs) in groups {
        if indices.len() != outputs.len() {
            return Err(Error::UnexpectedReply {
                operation: operation.to_owned(),
                reply: format!("{} values for {} keys", outputs.len(), indices.len()),
            });
        }
        for (i, output) in indices.into_iter().zip(outputs) {
            slots[i] = Some(output);
        }
    }
    Ok(slots.into_iter().flatten().collect())
}
